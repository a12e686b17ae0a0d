/// Answers "is the button hovered?" whenever the button asks, instead of the
/// button tracking hover from enter/leave alone.
pub trait HoverSource {
    fn is_hovered(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantHover(pub bool);

impl HoverSource for ConstantHover {
    fn is_hovered(&self) -> bool {
        self.0
    }
}

/// Re-evaluates a closure on every query.
pub struct PredicateHover<F>(pub F);

impl<F> PredicateHover<F>
where
    F: Fn() -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> HoverSource for PredicateHover<F>
where
    F: Fn() -> bool,
{
    fn is_hovered(&self) -> bool {
        (self.0)()
    }
}
