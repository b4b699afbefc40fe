//! Detect command: report the statement layout of each file

use std::path::PathBuf;

use anyhow::Result;
use ledgerprep_core::import::detect_file;

use super::display_name;

pub fn cmd_detect(files: &[PathBuf]) -> Result<bool> {
    let mut all_ok = true;

    for file in files {
        match detect_file(file) {
            Ok(dialect) => println!("{}: {}", display_name(file), dialect),
            Err(e) => {
                println!("{}: ❌ {}", display_name(file), e);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}
