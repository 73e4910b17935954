//! Hybrid overlays used for error-carried-forward re-runs.
//!
//! A [`HybridModule`] looks like the student module except that a chosen
//! set of names is taken from master. Nothing is mutated: the student module
//! stays exactly as submitted, and every overlay is built fresh for the patch
//! set it serves.

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::module::ModuleRef;

/// Which implementation an attribute of a hybrid comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Master,
    Student,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Master => "master",
            Self::Student => "student",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("cannot substitute '{name}': reference implementation {origin} does not define it")]
    MissingInMaster { name: String, origin: String },
}

pub struct HybridModule {
    student: ModuleRef,
    master: ModuleRef,
    overrides: BTreeMap<String, Source>,
}

impl HybridModule {
    /// Overlay `student` with master's versions of `names`.
    ///
    /// Fails if master does not define one of the names.
    pub fn patch<I, S>(student: &ModuleRef, master: &ModuleRef, names: I) -> Result<ModuleRef, PatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            if !master.has(name) {
                return Err(PatchError::MissingInMaster {
                    name: name.to_string(),
                    origin: master.origin().to_string(),
                });
            }
            overrides.insert(name.to_string(), Source::Master);
        }
        debug!(
            student = student.origin(),
            patched = ?overrides.keys().collect::<Vec<_>>(),
            "built hybrid module"
        );
        Ok(ModuleRef::Hybrid(Rc::new(Self {
            student: student.clone(),
            master: master.clone(),
            overrides,
        })))
    }

    pub fn student(&self) -> &ModuleRef {
        &self.student
    }

    pub fn master(&self) -> &ModuleRef {
        &self.master
    }

    pub(crate) fn is_patched(&self, name: &str) -> bool {
        self.overrides.get(name) == Some(&Source::Master)
    }

    /// Names served from master, sorted.
    pub fn patched(&self) -> impl Iterator<Item = &str> {
        self.overrides
            .iter()
            .filter(|(_, source)| **source == Source::Master)
            .map(|(name, _)| name.as_str())
    }

    /// Where `name` resolves from, or `None` if neither side defines it.
    pub fn source_of(&self, name: &str) -> Option<Source> {
        if self.is_patched(name) {
            Some(Source::Master)
        } else if self.student.has(name) {
            Some(Source::Student)
        } else {
            None
        }
    }
}
