//! Multi-value fulfillment.
//!
//! A [`Manifold`] fulfills a promise with up to three ordered values. Consumers
//! are free to ignore the trailing ones, so order them from most to least
//! important.
//!
//! ```
//! use dispatch_promise::Manifold;
//!
//! let m = Manifold::three("body", 200_u16, "text/plain");
//! assert_eq!(*m.first(), "body");
//! if let Manifold::Three(body, status, mime) = m {
//!     assert_eq!((body, status, mime), ("body", 200, "text/plain"));
//! }
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifold<A, B = (), C = ()> {
    One(A),
    Two(A, B),
    Three(A, B, C),
}

impl<A> Manifold<A> {
    pub fn one(a: A) -> Self {
        Manifold::One(a)
    }
}

impl<A, B> Manifold<A, B> {
    pub fn two(a: A, b: B) -> Self {
        Manifold::Two(a, b)
    }
}

impl<A, B, C> Manifold<A, B, C> {
    pub fn three(a: A, b: B, c: C) -> Self {
        Manifold::Three(a, b, c)
    }

    /// Number of values carried, 1 to 3.
    pub fn arity(&self) -> usize {
        match self {
            Manifold::One(..) => 1,
            Manifold::Two(..) => 2,
            Manifold::Three(..) => 3,
        }
    }

    pub fn first(&self) -> &A {
        match self {
            Manifold::One(a) | Manifold::Two(a, _) | Manifold::Three(a, _, _) => a,
        }
    }

    pub fn second(&self) -> Option<&B> {
        match self {
            Manifold::One(_) => None,
            Manifold::Two(_, b) | Manifold::Three(_, b, _) => Some(b),
        }
    }

    pub fn third(&self) -> Option<&C> {
        match self {
            Manifold::Three(_, _, c) => Some(c),
            _ => None,
        }
    }

    /// Keeps the leading value, the way a one-argument consumer sees it.
    pub fn into_first(self) -> A {
        self.into_parts().0
    }

    pub fn into_parts(self) -> (A, Option<B>, Option<C>) {
        match self {
            Manifold::One(a) => (a, None, None),
            Manifold::Two(a, b) => (a, Some(b), None),
            Manifold::Three(a, b, c) => (a, Some(b), Some(c)),
        }
    }
}

impl<A, B> From<(A, B)> for Manifold<A, B> {
    fn from((a, b): (A, B)) -> Self {
        Manifold::Two(a, b)
    }
}

impl<A, B, C> From<(A, B, C)> for Manifold<A, B, C> {
    fn from((a, b, c): (A, B, C)) -> Self {
        Manifold::Three(a, b, c)
    }
}

#[cfg(test)]
mod tests {
    use super::Manifold;

    #[test]
    fn test_arity_and_positions() {
        let one = Manifold::one(1);
        assert_eq!(one.arity(), 1);
        assert_eq!(one.second(), None);

        let two: Manifold<i32, &str> = (1, "two").into();
        assert_eq!(two.arity(), 2);
        assert_eq!(two.second(), Some(&"two"));
        assert_eq!(two.third(), None);

        let three = Manifold::three(1, "two", 3.0);
        assert_eq!(three.arity(), 3);
        assert_eq!(three.third(), Some(&3.0));
    }

    #[test]
    fn test_trailing_values_may_be_ignored() {
        let m = Manifold::three(String::from("a"), 'b', 3_u8);
        assert_eq!(m.clone().into_first(), "a");
        assert_eq!(m.into_parts(), (String::from("a"), Some('b'), Some(3)));
    }
}
