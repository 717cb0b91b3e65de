//! Named light output channels.

use arrayvec::{ArrayString, ArrayVec};

use crate::error::ModelError;

/// Upper bound on the number of output channels in a set.
pub const MAX_CHANNELS: usize = 16;

/// A channel name, stored inline.
pub type ChannelName = ArrayString<16>;

/// The channel names of the reference installation, in index order.
pub const DEFAULT_CHANNELS: [&str; 10] = [
    "garage",
    "top-right",
    "bottom-right",
    "col-1",
    "col-2",
    "col-3",
    "window",
    "outline",
    "garden",
    "tree",
];

/// A fixed, ordered set of named output channels.
///
/// A note's `lights` entries are indices into this set. Lookup is total:
/// out-of-range indices yield `None`, never a panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSet {
    names: ArrayVec<ChannelName, MAX_CHANNELS>,
}

impl Default for ChannelSet {
    fn default() -> Self {
        let mut names = ArrayVec::new();
        for name in DEFAULT_CHANNELS {
            // DEFAULT_CHANNELS fits both bounds
            if let Ok(n) = ChannelName::from(name) {
                names.push(n);
            }
        }
        Self { names }
    }
}

impl ChannelSet {
    /// Build a set from names in index order.
    pub fn from_names<I, S>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if names.len() > MAX_CHANNELS {
            return Err(ModelError::TooManyChannels {
                max: MAX_CHANNELS,
                count: names.len(),
            });
        }

        let mut set = ArrayVec::new();
        for name in &names {
            let name = name.as_ref();
            let parsed = ChannelName::from(name)
                .ok()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ModelError::InvalidChannelName(name.to_string()))?;
            if set.contains(&parsed) {
                return Err(ModelError::DuplicateChannel(name.to_string()));
            }
            set.push(parsed);
        }
        Ok(Self { names: set })
    }

    /// Name of the channel at `index`.
    pub fn name(&self, index: u8) -> Option<ChannelName> {
        self.names.get(index as usize).copied()
    }

    pub fn contains(&self, index: u8) -> bool {
        (index as usize) < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }
}
