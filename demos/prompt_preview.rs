use std::error::Error;

use query_insights::example_apps::run_prompt_preview;

fn main() -> Result<(), Box<dyn Error>> {
    run_prompt_preview(std::env::args().skip(1))
}
