use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    segments::example_apps::run_sample_segments(std::env::args().skip(1))
}
