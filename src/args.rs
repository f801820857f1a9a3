use clap::Parser;

/// Merges precinct vote tallies with voting station locations.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the merge settings: input and output paths, candidate
    /// columns, extra county spellings. Paths in this file are relative to its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, default election_2025_official.csv) The official results, one row per station.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub votes: Option<String>,

    /// (file path, default romanian_voting_stations_full.csv) The station locations.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub locations: Option<String>,

    /// (file path, default merged_voting_stations.csv) Where the merged table is written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, the per-UAT averages and the deviation columns are not computed.
    #[clap(long, takes_value = false)]
    pub no_uat: bool,

    /// (file path) A reference CSV file. If provided, the merged table is compared against it and
    /// the differences are printed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
