use anyhow::{ensure, Context};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use sxp_chain::serde::Amount;
use sxp_mapping::{ArchivingFormulas, ArchivingParams, SubspaceArchiving};
use sxp_model::{EntitySet, Operator};


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArchivingVersion {
    pub from_spec_version: u32,
    #[serde(default)]
    pub params: ArchivingParams
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenesisOperator {
    pub id: u64,
    pub signing_key: String,
    pub domain_id: u32,
    #[serde(default)]
    pub minimum_nominator_stake: Amount,
    #[serde(default)]
    pub nomination_tax: u8,
    #[serde(default)]
    pub total_stake: Amount,
    #[serde(default)]
    pub total_shares: Amount
}


impl GenesisOperator {
    fn to_operator(&self) -> Operator {
        let mut op = Operator::new(&self.id.to_string(), 0);
        op.signing_key = self.signing_key.clone();
        op.domain_id = self.domain_id;
        op.minimum_nominator_stake = self.minimum_nominator_stake.0;
        op.nomination_tax = self.nomination_tax;
        op.total_stake = self.total_stake.0;
        op.total_shares = self.total_shares.0;
        op
    }
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// JSON lines file with block batches
    pub archive: PathBuf,
    /// Archiving formula overrides, the runtime defaults apply when empty
    #[serde(default)]
    pub archiving: Vec<ArchivingVersion>,
    #[serde(default)]
    pub genesis_operators: Vec<GenesisOperator>
}


impl Config {
    pub fn read_config_file(file: &str) -> anyhow::Result<Config> {
        let reader = std::io::BufReader::new(std::fs::File::open(file)?);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut versions = BTreeSet::new();
        for v in self.archiving.iter() {
            ensure!(
                versions.insert(v.from_spec_version),
                "archiving formula for spec version {} is defined twice",
                v.from_spec_version
            );
            v.params.validate().with_context(|| {
                format!("invalid archiving params for spec version {}", v.from_spec_version)
            })?;
        }

        let mut operators = BTreeSet::new();
        for op in self.genesis_operators.iter() {
            ensure!(operators.insert(op.id), "genesis operator {} is defined twice", op.id);
            ensure!(
                op.nomination_tax <= 100,
                "nomination tax of genesis operator {} exceeds 100%",
                op.id
            );
        }
        Ok(())
    }

    pub fn archiving_formulas(&self) -> ArchivingFormulas {
        if self.archiving.is_empty() {
            return ArchivingFormulas::default()
        }
        let mut formulas = ArchivingFormulas::new();
        for v in self.archiving.iter() {
            formulas.register(v.from_spec_version, Arc::new(SubspaceArchiving::new(v.params.clone())));
        }
        formulas
    }

    pub fn genesis_entities(&self) -> EntitySet {
        let mut set = EntitySet::default();
        for op in self.genesis_operators.iter() {
            set.insert(op.to_operator());
        }
        set
    }
}
