//! Stores [Pat]s behind copyable [PatId]s.
use tern_utils::index_vec::{define_index_type, IndexVec};

use crate::{pat::Pat, ExhaustivenessChecker, ExhaustivenessEnv};

define_index_type! {
    /// Id of a [Pat] in the [PatStore].
    pub struct PatId = u32;

    MAX_INDEX = u32::max_value() as usize;
    DISABLE_MAX_INDEX_CHECK = cfg!(not(debug_assertions));
}

/// The arena of every pattern the checker works on. The stages that lower
/// match clauses push their patterns in here, and the analysis itself pushes
/// the patterns it synthesises, i.e. wildcards, discriminators and witnesses.
/// Patterns are immutable once created, which is what makes it fine for
/// specialised rows to share ids.
pub type PatStore = IndexVec<PatId, Pat>;

impl<'env, E: ExhaustivenessEnv> ExhaustivenessChecker<'env, E> {
    /// Look up a pattern by id.
    pub fn get_pat(&self, id: PatId) -> &Pat {
        &self.pats[id]
    }

    /// Intern a pattern, returning its id.
    pub fn make_pat(&mut self, pat: Pat) -> PatId {
        self.pats.push(pat)
    }
}
