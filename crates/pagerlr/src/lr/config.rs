/// How much the table builder writes to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogVerbosity {
    /// Nothing is logged
    Silent,

    /// Conflicts are logged with a dump of the automaton, plus notices about defaults
    #[default]
    ProblemsOnly,

    /// The grammar and every state are logged, and progress while states are created
    Verbose,
}

impl LogVerbosity {
    /// Whether problems and notices are logged
    #[must_use]
    pub const fn reports_problems(self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Whether the full automaton and progress are logged
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }
}
