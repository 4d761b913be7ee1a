#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = swapgrid_cli::run_from_env() {
        eprintln!("swapgrid: {error}");
        std::process::exit(error.exit_code());
    }
}
