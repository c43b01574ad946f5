//! Property definitions and the run/shrink loop.

use crate::arbitrary::Arbitrary;
use crate::random::Random;
use crate::value::Value;
use std::fmt;

/// Configuration for running a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of generated values to check.
    pub num_runs: usize,

    /// Maximum number of shrink candidates to evaluate.
    pub shrink_limit: usize,

    /// Seed for the run. A random one is drawn when absent.
    pub seed: Option<u64>,

    /// Whether generation is biased toward boundary values.
    pub bias: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_runs: 100,
            shrink_limit: 1000,
            seed: None,
            bias: true,
        }
    }
}

impl Config {
    /// Create a new config with the given number of runs.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.num_runs = runs;
        self
    }

    /// Create a new config with the given shrink limit.
    pub fn with_shrinks(mut self, shrinks: usize) -> Self {
        self.shrink_limit = shrinks;
        self
    }

    /// Create a new config with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Create a new config with unbiased generation.
    pub fn without_bias(mut self) -> Self {
        self.bias = false;
        self
    }
}

/// Bias factor for the given run: strong at first, weaker as runs go on.
pub fn bias_factor(run: usize) -> u32 {
    2 + (run + 1).ilog10()
}

/// A shrinking step in the failure progression.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkStep<T> {
    /// The counterexample value at this step.
    pub counterexample: T,
    /// The step number (0 = original, 1+ = accepted shrinks).
    pub step: usize,
}

/// A falsified property.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure<T> {
    /// The smallest failing value found.
    pub counterexample: T,
    /// Seed to pass to [`Config::with_seed`] to reproduce the run.
    pub seed: u64,
    /// Checks performed before the failure, examples included.
    pub tests_run: usize,
    /// Shrink candidates evaluated against the predicate.
    pub shrink_evaluations: usize,
    /// The failing values from the original one down to the counterexample.
    pub shrink_steps: Vec<ShrinkStep<T>>,
    pub property_name: Option<String>,
}

impl<T> Failure<T> {
    /// Number of accepted shrinks.
    pub fn shrinks_performed(&self) -> usize {
        self.shrink_steps.len().saturating_sub(1)
    }
}

/// Outcome of running a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Passed {
        tests_run: usize,
        property_name: Option<String>,
    },
    Failed(Failure<T>),
}

impl<T> Outcome<T> {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed { .. })
    }

    pub fn failure(&self) -> Option<&Failure<T>> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            Outcome::Passed { .. } => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed {
                tests_run,
                property_name,
            } => {
                let name = property_name.as_deref().unwrap_or("property");
                write!(f, "  ✓ {name} passed {tests_run} tests.")
            }
            Outcome::Failed(failure) => write!(f, "{failure}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Failure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.property_name.as_deref().unwrap_or("property");
        writeln!(
            f,
            "  ✗ {name} failed after {} tests and {} shrinks.",
            self.tests_run,
            self.shrinks_performed()
        )?;

        if self.shrink_steps.len() > 1 {
            writeln!(f)?;
            writeln!(f, "    Shrinking progression:")?;
            for step in &self.shrink_steps {
                writeln!(f, "      {}: {:?}", step.step, step.counterexample)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "    Counterexample: {:?}", self.counterexample)?;
        write!(f, "    This failure can be reproduced with seed {}.", self.seed)
    }
}

type Predicate<T> = Box<dyn Fn(&T) -> bool>;

/// A property that can be tested with generated inputs.
pub struct Property<A: Arbitrary> {
    arbitrary: A,
    predicate: Predicate<A::Item>,
    examples: Vec<A::Item>,
    name: Option<String>,
}

impl<A: Arbitrary> Property<A> {
    /// Create a property that checks a boolean condition.
    pub fn for_all<F>(arbitrary: A, predicate: F) -> Self
    where
        F: Fn(&A::Item) -> bool + 'static,
    {
        Property {
            arbitrary,
            predicate: Box::new(predicate),
            examples: Vec::new(),
            name: None,
        }
    }

    /// Values checked before any generated one.
    ///
    /// A failing example is shrunk from scratch when the arbitrary accepts it,
    /// and reported as is otherwise.
    pub fn with_examples(mut self, examples: Vec<A::Item>) -> Self {
        self.examples = examples;
        self
    }

    /// Name used when reporting.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Run this property with the given configuration.
    pub fn run(&self, config: &Config) -> Outcome<A::Item> {
        let seed = config.seed.unwrap_or_else(Random::random_seed);
        let mut tests_run = 0;

        for example in &self.examples {
            tests_run += 1;
            if (self.predicate)(example) {
                continue;
            }
            tracing::debug!(tests_run, "explicit example failed");
            let shrinkable = self.arbitrary.can_shrink_without_context(example);
            let value = Value::without_context(example.clone());
            return Outcome::Failed(self.shrink_failure(value, shrinkable, seed, tests_run, config));
        }

        let mut rng = Random::from_seed(seed);
        for run in 0..config.num_runs {
            tests_run += 1;
            let bias = config.bias.then(|| bias_factor(run));
            let value = self.arbitrary.generate(&mut rng, bias);
            if (self.predicate)(&value.value) {
                continue;
            }
            tracing::debug!(run, seed, "property failed, shrinking");
            return Outcome::Failed(self.shrink_failure(value, true, seed, tests_run, config));
        }

        Outcome::Passed {
            tests_run,
            property_name: self.name.clone(),
        }
    }

    /// Run this property and panic with the report if it fails.
    pub fn check(&self, config: &Config)
    where
        A::Item: fmt::Debug,
    {
        if let Outcome::Failed(failure) = self.run(config) {
            panic!("\n{failure}");
        }
    }

    /// Repeatedly move to the first candidate that still fails.
    fn shrink_failure(
        &self,
        failing: Value<A::Item, A::Context>,
        shrinkable: bool,
        seed: u64,
        tests_run: usize,
        config: &Config,
    ) -> Failure<A::Item> {
        let mut shrink_steps = vec![ShrinkStep {
            counterexample: failing.value.clone(),
            step: 0,
        }];
        let mut current = failing;
        let mut evaluations = 0;

        'shrinking: while shrinkable {
            let candidates = self
                .arbitrary
                .shrink(&current.value, current.context.as_ref());
            for candidate in candidates {
                if evaluations >= config.shrink_limit {
                    tracing::debug!(evaluations, "shrink limit reached");
                    break 'shrinking;
                }
                evaluations += 1;
                if !(self.predicate)(&candidate.value) {
                    let step = shrink_steps.len();
                    tracing::trace!(step, evaluations, "shrink accepted");
                    shrink_steps.push(ShrinkStep {
                        counterexample: candidate.value.clone(),
                        step,
                    });
                    current = candidate;
                    continue 'shrinking;
                }
            }
            break;
        }

        Failure {
            counterexample: current.value,
            seed,
            tests_run,
            shrink_evaluations: evaluations,
            shrink_steps,
            property_name: self.name.clone(),
        }
    }
}

/// Create a property that checks a boolean condition.
pub fn for_all<A, F>(arbitrary: A, predicate: F) -> Property<A>
where
    A: Arbitrary,
    F: Fn(&A::Item) -> bool + 'static,
{
    Property::for_all(arbitrary, predicate)
}
