use clap::Parser;
use kscene_utils::{ok, AnyResult};

fn main() -> AnyResult {
    let cli = kscene_tool::Cli::parse_from(wild::args());

    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(cli.log_level())
        .init();

    kscene_tool::run(cli)?;
    ok()
}
