//! Generated values paired with their shrink context.

/// A produced value and the context needed to resume shrinking it.
///
/// The context is opaque to everyone but the arbitrary that produced the
/// value. `None` means "no prior knowledge": shrinking starts from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value<T, C> {
    pub value: T,
    pub context: Option<C>,
}

impl<T, C> Value<T, C> {
    /// Create a new value with the given context.
    pub fn new(value: T, context: Option<C>) -> Self {
        Value { value, context }
    }

    /// Create a value with no shrink context.
    pub fn without_context(value: T) -> Self {
        Value {
            value,
            context: None,
        }
    }

    /// Transform the value, keeping the context.
    pub fn map<U, F>(self, f: F) -> Value<U, C>
    where
        F: FnOnce(T) -> U,
    {
        Value {
            value: f(self.value),
            context: self.context,
        }
    }

    /// Transform the context, keeping the value.
    pub fn map_context<D, F>(self, f: F) -> Value<T, D>
    where
        F: FnOnce(C) -> D,
    {
        Value {
            value: self.value,
            context: self.context.map(f),
        }
    }

    /// Split into value and context.
    pub fn into_parts(self) -> (T, Option<C>) {
        (self.value, self.context)
    }
}

impl<T, C> From<T> for Value<T, C> {
    fn from(value: T) -> Self {
        Value::without_context(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_context() {
        let value: Value<i32, i64> = Value::without_context(42);
        assert_eq!(value.value, 42);
        assert!(value.context.is_none());
    }

    #[test]
    fn test_map_keeps_context() {
        let value = Value::new(10, Some(4_i64));
        let mapped = value.map(|x| x * 2);
        assert_eq!(mapped, Value::new(20, Some(4)));
    }

    #[test]
    fn test_map_context() {
        let value = Value::new("a", Some(1_u8));
        let (v, ctx) = value.map_context(|c| c as u32 + 1).into_parts();
        assert_eq!(v, "a");
        assert_eq!(ctx, Some(2));
    }
}
