use std::env;
use std::process;

fn main() {
    phomemo::backend::init_logging();
    let args: Vec<String> = env::args().collect();
    process::exit(phomemo::backend::run(&args));
}
