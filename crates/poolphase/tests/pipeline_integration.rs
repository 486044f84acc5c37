// End-to-end pipeline runs over temporary frameworks

use poolload::TypedProgram;
use poolphase::{
    run_generation, GenerationConfig, PipelineEngine, PipelineError, PipelineState, RunVerdict,
};
use poolsynth::{PoolSynthesizer, SynthError, SynthesisOutput};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, content).expect("write file");
}

fn pool_listing(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("pool"))
        .expect("read pool")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Framework with two modules and a project whose config imports both.
fn framework() -> TempDir {
    let dir = tempdir().expect("tempdir");
    write(
        dir.path(),
        "modules/base/partner.rs",
        r#"
use pool;

/// A business partner
#[model]
pub struct Partner {
    pub name: String,
    pub parent: Option<pool::Partner>,
}
"#,
    );
    write(
        dir.path(),
        "modules/sale/order.rs",
        r#"
use pool;

#[model]
pub struct Partner {
    pub credit: f64,
}

#[model]
pub struct SaleOrder {
    pub partner: pool::Partner,
    pub amount: f64,
}

pub fn confirm(order: &pool::SaleOrder) -> bool {
    true
}
"#,
    );
    write(
        dir.path(),
        "project/config/imports.rs",
        "use modules::base;\nuse modules::sale;\n",
    );
    dir
}

fn config(root: &Path) -> GenerationConfig {
    let mut config = GenerationConfig::new(root);
    config.project_dir = root.join("project");
    config
}

fn run(config: GenerationConfig) -> (RunVerdict, String) {
    let mut out = Vec::new();
    let verdict = run_generation(config, &mut out);
    (verdict, String::from_utf8(out).expect("utf8 progress"))
}

#[test]
fn full_run_generates_and_validates_pool() {
    let dir = framework();
    let (verdict, progress) = run(config(dir.path()));

    assert!(verdict.is_success(), "run failed: {:?}", verdict.error);
    assert_eq!(
        verdict.trace,
        vec![
            PipelineState::Start,
            PipelineState::Staged,
            PipelineState::Resolved,
            PipelineState::Loaded,
            PipelineState::Synthesized,
            PipelineState::Validated,
            PipelineState::Done,
        ]
    );
    assert_eq!(
        pool_listing(dir.path()),
        vec!["partner.rs", "registry.rs", "sale_order.rs", "temp.rs"]
    );

    let report = &verdict.report;
    assert_eq!(report.package.as_deref(), Some("config"));
    assert_eq!(report.imports, vec!["modules::base", "modules::sale"]);
    assert_eq!(report.models, vec!["Partner", "SaleOrder"]);
    assert!(report.warnings > 0);
    assert!(report.digest.is_some());

    assert!(progress.contains("Project package found: config."));
    assert!(progress.contains("Loading program...\n"));
    assert!(progress.contains("Generating pool...Ok\n"));
    assert!(progress.contains("Checking the generated code...Ok\n"));
    assert!(progress.ends_with("Pool generated successfully\n"));
}

#[test]
fn empty_pool_leaves_only_the_placeholder() {
    let dir = framework();
    write(dir.path(), "pool/stale.rs", "pub struct Stale;");

    let mut config = config(dir.path());
    config.empty_pool = true;
    let (verdict, progress) = run(config);

    assert!(verdict.is_success());
    assert_eq!(
        verdict.trace,
        vec![PipelineState::Start, PipelineState::Staged, PipelineState::Done]
    );
    assert_eq!(pool_listing(dir.path()), vec!["temp.rs"]);
    assert!(progress.is_empty());
}

#[test]
fn test_mode_only_sees_the_module_under_test() {
    let dir = framework();
    let mut config = config(dir.path());
    config.test_module = Some(dir.path().join("modules/base"));
    let (verdict, _) = run(config);

    assert!(verdict.is_success(), "run failed: {:?}", verdict.error);
    assert_eq!(verdict.report.imports, vec!["modules::base"]);
    assert!(!verdict
        .report
        .loaded_packages
        .contains(&"modules::sale".to_string()));
    assert_eq!(verdict.report.models, vec!["Partner"]);
    assert_eq!(
        pool_listing(dir.path()),
        vec!["partner.rs", "registry.rs", "temp.rs"]
    );
}

#[test]
fn runs_are_deterministic() {
    let dir = framework();
    let (first, _) = run(config(dir.path()));
    let (second, _) = run(config(dir.path()));

    assert!(first.is_success() && second.is_success());
    assert_eq!(first.report.digest, second.report.digest);
    assert_eq!(first.report.files, second.report.files);
}

#[test]
fn resolution_failure_leaves_staged_placeholder() {
    let dir = framework();
    write(dir.path(), "pool/stale.rs", "pub struct Stale;");

    let mut config = config(dir.path());
    config.project_dir = dir.path().join("missing-project");
    let (verdict, _) = run(config);

    assert_eq!(verdict.state, PipelineState::Aborted);
    assert_eq!(
        verdict.trace,
        vec![PipelineState::Start, PipelineState::Staged, PipelineState::Aborted]
    );
    assert!(matches!(verdict.error, Some(PipelineError::Resolve(_))));
    assert_eq!(pool_listing(dir.path()), vec!["temp.rs"]);
}

#[test]
fn malformed_target_package_is_fatal() {
    let dir = framework();
    write(dir.path(), "project/config/broken.rs", "use modules::base\n");
    let (verdict, _) = run(config(dir.path()));

    assert!(matches!(verdict.error, Some(PipelineError::Resolve(_))));
}

/// Writes a file the strict loader must reject.
struct BrokenSynthesizer {
    source: &'static str,
}

impl PoolSynthesizer for BrokenSynthesizer {
    fn synthesize(&self, _: &TypedProgram, out_dir: &Path) -> Result<SynthesisOutput, SynthError> {
        let path = out_dir.join("broken.rs");
        fs::write(&path, self.source).map_err(|source| SynthError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(SynthesisOutput {
            models: vec!["Broken".to_string()],
            files: vec![path],
        })
    }
}

#[test]
fn validation_rejects_invalid_synthesizer_output() {
    for source in [
        "#![package(pool)]\npub struct Broken {\n",
        "#![package(pool)]\npub struct Broken {\n    pub other: Missing,\n}\n",
    ] {
        let dir = framework();
        let engine = PipelineEngine::with_synthesizer(
            config(dir.path()),
            BrokenSynthesizer { source },
        );
        let mut out = Vec::new();
        let verdict = engine.run(&mut out);

        assert_eq!(verdict.state, PipelineState::Aborted);
        assert_eq!(
            verdict.trace.last().copied(),
            Some(PipelineState::Aborted)
        );
        assert!(verdict.trace.contains(&PipelineState::Synthesized));
        assert!(!verdict.trace.contains(&PipelineState::Validated));
        assert!(matches!(verdict.error, Some(PipelineError::Validation(_))));

        let progress = String::from_utf8(out).expect("utf8");
        assert!(progress.contains("Checking the generated code...FAIL"));
    }
}

#[test]
fn conflicting_fragments_abort_synthesis() {
    let dir = framework();
    write(
        dir.path(),
        "modules/sale/extra.rs",
        "#[model]\npub struct Invoice {\n    pub total: f64,\n}\n",
    );
    write(
        dir.path(),
        "modules/base/extra.rs",
        "#[model]\npub struct Invoice {\n    pub total: String,\n}\n",
    );
    let (verdict, _) = run(config(dir.path()));

    assert!(matches!(
        verdict.error,
        Some(PipelineError::Synthesis(SynthError::ConflictingField { .. }))
    ));
}

#[test]
fn empty_import_set_is_fatal() {
    let dir = framework();
    write(dir.path(), "project/config/imports.rs", "pub struct Nothing;\n");
    let (verdict, _) = run(config(dir.path()));

    assert_eq!(verdict.state, PipelineState::Aborted);
    assert!(matches!(verdict.error, Some(PipelineError::Load(_))));
}
