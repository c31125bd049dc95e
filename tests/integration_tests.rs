use std::fs;
use std::path::Path;

use matrun::{Config, MatlabRunner, RunFlags, Statement};

#[test]
fn test_all_sample_commands() {
  let samples_dir = Path::new("./tests/samples");
  let expected_dir = Path::new("./tests/expected");
  let mut checked = 0;

  // Iterate through all .matrun files in the samples directory
  for entry in fs::read_dir(samples_dir).expect("Could not read samples directory") {
    let entry = entry.expect("Invalid entry in samples directory");
    let path = entry.path();
    if path.extension().and_then(|e| e.to_str()) == Some("matrun") {
      let file_stem = path.file_stem().and_then(|s| s.to_str()).expect("No file stem");

      let expected_file = expected_dir.join(format!("{}.txt", file_stem));
      assert!(
        expected_file.exists(),
        "Expected file {:?} does not exist for sample {:?}",
        expected_file,
        path
      );
      let expected_output = fs::read_to_string(&expected_file)
        .expect("Could not read expected file");

      let config = Config::load(&path)
        .unwrap_or_else(|e| panic!("Failed to load sample {:?}: {:#}", file_stem, e));
      let mut runner = MatlabRunner::new("matlab");
      config
        .apply(&mut runner)
        .unwrap_or_else(|e| panic!("Failed to apply sample {:?}: {:#}", file_stem, e));

      let actual_output = runner
        .build_command(&Statement::from("run"), &RunFlags::default())
        .expect("Failed to build command");

      assert_eq!(
        expected_output.trim(),
        actual_output.trim(),
        "Output mismatch for sample {:?}",
        file_stem
      );
      checked += 1;
    }
  }

  assert!(checked > 0, "No samples found in {:?}", samples_dir);
}

#[test]
fn test_wrapped_statement_sequence() {
  let runner = MatlabRunner::new("matlab");
  let statement = Statement::from(vec!["output_folder='./data/level_c'", "subprocess"]);
  let flags = RunFlags::default().try_catch(true).auto_exit(true);

  let command = runner.build_command(&statement, &flags).unwrap();
  assert_eq!(
    command,
    "matlab  -r \"try, output_folder='./data/level_c', subprocess, catch err, \
     fprintf('%s %s', err.identifier, err.message), end, exit\""
  );
}
