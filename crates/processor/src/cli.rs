use clap::Parser;
use sxp_primitives::BlockNumber;


#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Processor config file
    #[arg(short, long, value_name = "FILE")]
    pub config: String,

    /// Store snapshot file, created if missing
    #[arg(short, long, value_name = "FILE")]
    pub store: String,

    /// First block to process when the store is empty
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub from_block: BlockNumber,
}
