use std::fmt;

/// An authenticated actor.
///
/// The engine trusts this value as given. Obtain one from an
/// [`IdentityProvider`](super::ports::IdentityProvider) or build it directly
/// where authentication happened elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
