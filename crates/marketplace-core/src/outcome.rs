#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Archive contents landed directly in the target directory.
    FlatLayout,
    /// Archive contents were wrapped in this subdirectory and have been moved up.
    NestedLayout(String),
    /// Neither layout could be recognized; the target was left as extracted.
    Unrecognized,
}

impl ExtractionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatLayout => "flat",
            Self::NestedLayout(_) => "nested",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeConflictDecision {
    /// The plugin theme is already the active theme.
    NoConflict,
    /// The plugin theme will be set as the active theme.
    ConflictResolvedReplace,
    /// The user chose to keep their existing theme.
    ConflictResolvedKeep,
}

impl ThemeConflictDecision {
    pub fn sets_theme(self) -> bool {
        matches!(self, Self::ConflictResolvedReplace)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoConflict => "no-conflict",
            Self::ConflictResolvedReplace => "replace",
            Self::ConflictResolvedKeep => "keep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRunOutcome {
    Success,
    Failure(String),
}

/// What one program run did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub standard: Option<InstallRunOutcome>,
    /// Answer to "did it work?"; `None` when the question was never asked.
    pub verified: Option<bool>,
    pub force_reinstall: Option<InstallRunOutcome>,
}

impl SessionReport {
    pub fn ran_force_reinstall(&self) -> bool {
        self.force_reinstall.is_some()
    }
}
