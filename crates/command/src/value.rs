//! Literal or deferred argument values.

use std::fmt;
use std::ops::Add;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An argument that is either fixed at authoring time or computed each
/// time it is read.
///
/// Deferred values let one command track another object's live state:
/// the thunk runs at the point of use, never earlier. Serializing a
/// value writes its current resolution, so deferred values are frozen.
pub enum Value<T> {
    Literal(T),
    Deferred(Rc<dyn Fn() -> T>),
}

impl<T: Clone> Value<T> {
    pub fn deferred(thunk: impl Fn() -> T + 'static) -> Self {
        Value::Deferred(Rc::new(thunk))
    }

    /// Resolves the value now.
    pub fn get(&self) -> T {
        match self {
            Value::Literal(value) => value.clone(),
            Value::Deferred(thunk) => thunk(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    /// A literal holding the current resolution.
    pub fn freeze(&self) -> Self {
        Value::Literal(self.get())
    }
}

impl<T: Clone + Add<Output = T>> Value<T> {
    /// Adds `delta` in place. A deferred value is frozen first, so the
    /// binding it carried is dropped.
    pub fn shift(&mut self, delta: T) {
        let current = self.get();
        if self.is_deferred() {
            log::debug!("shifting a deferred value freezes it");
        }
        *self = Value::Literal(current + delta);
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Value::Literal(value)
    }
}

impl<T: Default> Default for Value<T> {
    fn default() -> Self {
        Value::Literal(T::default())
    }
}

impl<T> Clone for Value<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Value::Literal(value) => Value::Literal(value.clone()),
            Value::Deferred(thunk) => Value::Deferred(Rc::clone(thunk)),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(value) => write!(f, "{:?}", value),
            Value::Deferred(_) => write!(f, "Deferred({:?})", self.get()),
        }
    }
}

impl<T: Clone + PartialEq> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: Clone + Serialize> Serialize for Value<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Value::Literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_deferred_resolves_at_use() {
        let source = Rc::new(Cell::new(1.0));
        let tracked = Rc::clone(&source);
        let value: Value<f64> = Value::deferred(move || tracked.get() * 2.0);
        assert_eq!(value.get(), 2.0);
        source.set(4.0);
        assert_eq!(value.get(), 8.0);
    }

    #[test]
    fn test_serialize_freezes() {
        let source = Rc::new(Cell::new(3.0));
        let tracked = Rc::clone(&source);
        let value: Value<f64> = Value::deferred(move || tracked.get());
        assert_eq!(serde_json::to_string(&value).unwrap(), "3.0");
        let back: Value<f64> = serde_json::from_str("3.0").unwrap();
        assert!(!back.is_deferred());
        assert_eq!(back, value);
    }

    #[test]
    fn test_shift_freezes_deferred() {
        let mut value: Value<f64> = Value::deferred(|| 5.0);
        value.shift(1.5);
        assert!(!value.is_deferred());
        assert_eq!(value.get(), 6.5);
    }
}
