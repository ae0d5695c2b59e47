use category_builder::Run;
use log::error;


fn main() {
    if let Err(e) = Run::run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
