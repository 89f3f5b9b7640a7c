fn main() -> anyhow::Result<()> {
    scorecast::cli::run_cli()
}
