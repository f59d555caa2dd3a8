//! Golden conversions: every `cases/*.py` must convert to the neighbouring
//! `.expected` file when uids are issued sequentially.

use std::{fs, path::Path};

use walrus::{ConvertConfig, Converter, UidGenerator};

fn run_case(path: &Path) -> datatest_stable::Result<()> {
    let source = fs::read_to_string(path)?;
    let expected = fs::read_to_string(path.with_extension("expected"))?;

    let mut converter = Converter::new(ConvertConfig::default()).with_uids(UidGenerator::sequential());
    let output = converter.convert(&source)?;
    pretty_assertions::assert_eq!(output, expected, "conversion of {}", path.display());

    let again = converter.convert(&output)?;
    pretty_assertions::assert_eq!(again, output, "converted output of {} changed again", path.display());
    Ok(())
}

datatest_stable::harness!(run_case, "tests/cases", r"^.*\.py$");
