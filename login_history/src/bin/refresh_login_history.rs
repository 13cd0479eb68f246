use login_history::cli;
use sf_session::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli::command().get_matches();
    logging::init(cli::logging_config(&matches))?;

    let status = cli::run(&matches)?;
    println!("{status}");
    Ok(())
}
