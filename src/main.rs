//! # imgmill CLI
//!
//! Command-line driver for the image transform pipeline.
//!
//! ## Usage
//! ```bash
//! imgmill process ./public
//! imgmill watch ./public --url-path /assets/images/
//! imgmill clear --output-dir public/assets/images
//! ```

mod cli;

use image_mill::Result;

fn main() -> Result<()> {
    cli::run()
}
