use log::error;

fn main() {
    if let Err(e) = c1219_tables::app() {
        error!("{:#}", e);
        eprintln!("c1219-decode: {:#}", e);
        std::process::exit(255);
    }
}
