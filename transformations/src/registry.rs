use std::fmt;

/// The closed set of transformations a batch can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Resize,
    Enlarge,
    Rotate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Resize, Self::Enlarge, Self::Rotate];

    /// Looks up an operation by its wire name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::Enlarge => "enlarge",
            Self::Rotate => "rotate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
