use serde::Deserialize;
use std::sync::Arc;


/// Converts consensus storage values into the block level size aggregates.
pub trait ArchivingFormula: Send + Sync {
    /// Estimated space pledged by farmers, `None` when it can't be derived.
    fn space_pledged(&self, solution_range: u64, storage_fees_escrow: Option<u128>) -> Option<u128>;

    /// Size of the archived history in bytes.
    fn blockchain_size(&self, segments_count: u64) -> Option<u128>;
}


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ArchivingParams {
    pub piece_size: u64,
    pub max_pieces_in_sector: u64,
    pub record_num_chunks: u64,
    pub record_num_s_buckets: u64,
    /// Numerator and denominator of the per slot block production probability
    pub slot_probability: (u64, u64),
    pub pieces_in_segment: u64
}


impl Default for ArchivingParams {
    fn default() -> Self {
        Self {
            piece_size: 1024 * 1024,
            max_pieces_in_sector: 1000,
            record_num_chunks: 32768,
            record_num_s_buckets: 65536,
            slot_probability: (1, 6),
            pieces_in_segment: 256
        }
    }
}


impl ArchivingParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.piece_size > 0, "piece size must be positive");
        anyhow::ensure!(self.pieces_in_segment > 0, "pieces in segment must be positive");
        anyhow::ensure!(
            self.slot_probability.0 > 0 && self.slot_probability.0 <= self.slot_probability.1,
            "slot probability must be within (0, 1]"
        );
        anyhow::ensure!(
            self.record_num_s_buckets > 0 &&
            self.max_pieces_in_sector as u128 * self.record_num_chunks as u128 >= self.record_num_s_buckets as u128,
            "sector audit parameters are inconsistent"
        );
        Ok(())
    }
}


/// Pledge estimate derived from the current solution range.
///
/// The storage fees escrow does not participate in this version.
#[derive(Debug, Clone, Default)]
pub struct SubspaceArchiving {
    params: ArchivingParams
}


impl SubspaceArchiving {
    pub fn new(params: ArchivingParams) -> Self {
        Self {
            params
        }
    }
}


impl ArchivingFormula for SubspaceArchiving {
    fn space_pledged(&self, solution_range: u64, _storage_fees_escrow: Option<u128>) -> Option<u128> {
        if solution_range == 0 {
            return None
        }
        let p = &self.params;
        let (num, den) = p.slot_probability;
        let audit_chunks = p.max_pieces_in_sector as u128 * p.record_num_chunks as u128
            / p.record_num_s_buckets as u128;
        let sector_size = p.max_pieces_in_sector as u128 * p.piece_size as u128;

        let sectors = (u64::MAX as u128)
            .checked_mul(num as u128)?
            .checked_div(den as u128)?
            .checked_div(audit_chunks)?
            / solution_range as u128;

        sectors.checked_mul(sector_size)
    }

    fn blockchain_size(&self, segments_count: u64) -> Option<u128> {
        (segments_count as u128)
            .checked_mul(self.params.pieces_in_segment as u128)?
            .checked_mul(self.params.piece_size as u128)
    }
}


/// Archiving formulas keyed by the runtime spec version they take effect from.
#[derive(Clone)]
pub struct ArchivingFormulas {
    versions: Vec<(u32, Arc<dyn ArchivingFormula>)>
}


impl Default for ArchivingFormulas {
    fn default() -> Self {
        Self {
            versions: vec![(0, Arc::new(SubspaceArchiving::default()))]
        }
    }
}


impl ArchivingFormulas {
    pub fn new() -> Self {
        Self {
            versions: Vec::new()
        }
    }

    pub fn register(&mut self, from_spec_version: u32, formula: Arc<dyn ArchivingFormula>) {
        match self.versions.binary_search_by_key(&from_spec_version, |(v, _)| *v) {
            Ok(i) => self.versions[i].1 = formula,
            Err(i) => self.versions.insert(i, (from_spec_version, formula))
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Picks the latest formula not newer than the given runtime.
    ///
    /// Runtimes preceding every registered version get the earliest one.
    pub fn get(&self, spec_version: u32) -> Option<&dyn ArchivingFormula> {
        let idx = self.versions.partition_point(|(v, _)| *v <= spec_version);
        let (_, formula) = self.versions.get(idx.saturating_sub(1))?;
        Some(formula.as_ref())
    }
}


impl std::fmt::Debug for ArchivingFormulas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.versions.iter().map(|(v, _)| v))
            .finish()
    }
}
