/// What a parent does when one of its children fails.
///
/// The failing child is always stopped (its own children first). The
/// directive only decides the parent's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorDirective {
    /// Let the child stop and keep running.
    #[default]
    Stop,
    /// Fail this actor too, passing the failure to its own parent.
    Escalate,
}
