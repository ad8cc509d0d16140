use std::sync::Arc;

use crate::evaluation_error::EvaluationError;
use crate::system::{Any, Equality, FromSystem};
use crate::traits::Node;

/// One element of a collection: a System value or a structured node.
#[derive(Debug, Clone)]
pub enum Item {
    System(Any),
    Node(Arc<dyn Node>),
}

impl Item {
    pub fn node(node: impl Node + 'static) -> Self {
        Item::Node(Arc::new(node))
    }

    /// The System value of this item, converting primitive nodes.
    pub fn to_system(&self) -> Option<Any> {
        match self {
            Item::System(value) => Some(value.clone()),
            Item::Node(node) => node.to_system(),
        }
    }

    pub fn as_node(&self) -> Option<&Arc<dyn Node>> {
        match self {
            Item::System(_) => None,
            Item::Node(node) => Some(node),
        }
    }

    /// Three-valued item equality. Values with a System form are normalized
    /// toward each other and compared; two structured nodes compare
    /// structurally.
    pub fn try_equal(&self, other: &Item) -> Equality {
        match (self.to_system(), other.to_system()) {
            (Some(lhs), Some(rhs)) => lhs.normalize(&rhs).try_equal(&rhs.normalize(&lhs)),
            (None, None) => match (self, other) {
                (Item::Node(lhs), Item::Node(rhs)) => Equality::from_bool(lhs.equals(rhs.as_ref())),
                _ => Equality::NotEqual,
            },
            _ => Equality::NotEqual,
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::System(lhs), Item::System(rhs)) => lhs == rhs,
            (Item::Node(lhs), Item::Node(rhs)) => lhs.equals(rhs.as_ref()),
            _ => false,
        }
    }
}

impl From<Any> for Item {
    fn from(value: Any) -> Self {
        Item::System(value)
    }
}

impl From<Arc<dyn Node>> for Item {
    fn from(node: Arc<dyn Node>) -> Self {
        Item::Node(node)
    }
}

macro_rules! system_item_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Item {
                fn from(value: $ty) -> Self {
                    Item::System(Any::from(value))
                }
            }
        )*
    };
}

system_item_from!(
    bool,
    i32,
    rust_decimal::Decimal,
    String,
    &str,
    crate::system::Date,
    crate::system::Time,
    crate::system::DateTime,
    crate::system::Quantity
);

/// An ordered FHIRPath collection.
///
/// Every expression evaluates to a collection; an empty one stands for
/// "no value" and a one-item collection for a single value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection(Vec<Item>);

impl Collection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn singleton(item: impl Into<Item>) -> Self {
        Self(vec![item.into()])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.0.get(index)
    }

    pub fn push(&mut self, item: impl Into<Item>) {
        self.0.push(item.into());
    }

    pub fn extend(&mut self, other: Collection) {
        self.0.extend(other.0);
    }

    /// The only item, `None` when empty, `NotSingleton` when there are more.
    pub fn single(&self) -> Result<Option<&Item>, EvaluationError> {
        match self.0.as_slice() {
            [] => Ok(None),
            [item] => Ok(Some(item)),
            items => Err(EvaluationError::NotSingleton(format!(
                "expected at most one item, found {}",
                items.len()
            ))),
        }
    }

    /// Singleton evaluation of a collection as a Boolean: empty is `None`, a
    /// Boolean singleton is its value and any other singleton is `true`.
    pub fn to_singleton_boolean(&self) -> Result<Option<bool>, EvaluationError> {
        Ok(self.single()?.map(|item| match item.to_system() {
            Some(Any::Boolean(b)) => b,
            _ => true,
        }))
    }

    /// Converts a singleton to a native value.
    pub fn to_single<T: FromSystem>(&self) -> Result<Option<T>, EvaluationError> {
        let Some(item) = self.single()? else {
            return Ok(None);
        };
        item.to_system()
            .as_ref()
            .and_then(T::from_system)
            .map(Some)
            .ok_or_else(|| {
                EvaluationError::NotConvertible(format!("{:?} is not a {}", item, T::TYPE_NAME))
            })
    }

    /// Three-valued collection equality: order-sensitive, item by item.
    pub fn try_equal(&self, other: &Collection) -> Equality {
        if self.len() != other.len() {
            return Equality::NotEqual;
        }
        let mut indeterminate = false;
        for (lhs, rhs) in self.iter().zip(other.iter()) {
            match lhs.try_equal(rhs) {
                Equality::NotEqual => return Equality::NotEqual,
                Equality::Indeterminate => indeterminate = true,
                Equality::Equal => {}
            }
        }
        if indeterminate {
            Equality::Indeterminate
        } else {
            Equality::Equal
        }
    }

    /// True when some item of the collection equals `item`.
    pub fn contains_item(&self, item: &Item) -> bool {
        self.iter().any(|candidate| candidate.try_equal(item) == Equality::Equal)
    }
}

impl From<Vec<Item>> for Collection {
    fn from(items: Vec<Item>) -> Self {
        Self(items)
    }
}

impl From<Any> for Collection {
    fn from(value: Any) -> Self {
        Self::singleton(value)
    }
}

impl FromIterator<Item> for Collection {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn lit(s: &str) -> Item {
        Item::System(Any::parse_literal(s).unwrap())
    }

    #[test]
    fn test_single() {
        assert_eq!(Collection::new().single().unwrap(), None);
        let two: Collection = vec![lit("1"), lit("2")].into();
        assert!(matches!(two.single(), Err(EvaluationError::NotSingleton(_))));
    }

    #[test]
    fn test_singleton_boolean() {
        assert_eq!(Collection::new().to_singleton_boolean().unwrap(), None);
        assert_eq!(Collection::singleton(false).to_singleton_boolean().unwrap(), Some(false));
        assert_eq!(Collection::singleton("x").to_singleton_boolean().unwrap(), Some(true));
    }

    #[test]
    fn test_to_single_widens() {
        let one = Collection::singleton(1);
        assert_eq!(one.to_single::<Decimal>().unwrap(), Some(Decimal::ONE));
        assert!(matches!(
            one.to_single::<String>(),
            Err(EvaluationError::NotConvertible(_))
        ));
    }

    #[test]
    fn test_collection_equality() {
        let a: Collection = vec![lit("1"), lit("@2020")].into();
        let b: Collection = vec![lit("1.0"), lit("@2020-01")].into();
        let c: Collection = vec![lit("2"), lit("@2020-01")].into();
        assert_eq!(a.try_equal(&b), Equality::Indeterminate);
        assert_eq!(a.try_equal(&c), Equality::NotEqual);
        assert_eq!(a.try_equal(&Collection::singleton(1)), Equality::NotEqual);
        assert_eq!(a.try_equal(&a.clone()), Equality::Equal);
    }

    #[test]
    fn test_contains_item_normalizes() {
        let numbers: Collection = vec![lit("1.0"), lit("2")].into();
        assert!(numbers.contains_item(&lit("1")));
        assert!(!numbers.contains_item(&lit("'1'")));
    }
}
