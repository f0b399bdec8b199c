use crate::cursor::{FrontEnd, SourceLocation};
use crate::error::{GenError, GenResult, ScanError, ScanErrorKind};
use crate::render::render;
use crate::scanner::{scan_tree, FileScan};
use crate::store::MetadataStore;
use crate::writer::{write_if_changed, WriteOutcome};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Output path, relative to the scan root
pub const DEFAULT_OUTPUT: &str = "gen/reflection.heartgen.cpp";
/// File names containing this are previous generator output
pub const GENERATED_TAG: &str = ".heartgen.";
pub const DEFAULT_EXTENSIONS: &[&str] = &["cpp", "c", "h", "hpp"];

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    /// Relative to `root`
    pub output: PathBuf,
    pub parallel: bool,
}

impl GeneratorOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_dirs: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            parallel: true,
        }
    }

    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs.extend(dirs);
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output)
    }
}

/// Everything a run produced. A run with errors still renders what it could.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub files_scanned: usize,
    pub metadata: MetadataStore,
    pub rendered: String,
    pub output_path: PathBuf,
    /// `None` when the output was only rendered
    pub outcome: Option<WriteOutcome>,
    pub errors: Vec<ScanError>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn type_count(&self) -> usize {
        self.metadata.types().len()
    }
}

pub struct Generator<F: FrontEnd> {
    options: GeneratorOptions,
    frontend: F,
}

impl<F: FrontEnd> Generator<F> {
    pub fn new(options: GeneratorOptions, frontend: F) -> Self {
        Self { options, frontend }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Scan, render and commit the generated file
    pub fn run(&self) -> GenResult<GenerationReport> {
        let mut report = self.render()?;
        report.outcome = Some(write_if_changed(&report.output_path, report.rendered.as_bytes())?);
        Ok(report)
    }

    /// Scan and render without touching the output file
    #[instrument(skip(self), fields(root = %self.options.root.display()))]
    pub fn render(&self) -> GenResult<GenerationReport> {
        let started = Instant::now();
        let (files, mut errors) = self.walk()?;
        info!(files = files.len(), "Scanning source files");

        let (metadata, scan_errors) = self.scan(&files);
        errors.extend(scan_errors);
        let rendered = render(&metadata);

        info!(
            types = metadata.types().len(),
            errors = errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(GenerationReport {
            files_scanned: files.len(),
            metadata,
            rendered,
            output_path: self.options.output_path(),
            outcome: None,
            errors,
        })
    }

    /// Recognised source files under the root, sorted, minus generated output
    pub fn discover(&self) -> GenResult<Vec<PathBuf>> {
        self.walk().map(|(files, _)| files)
    }

    /// Like [`discover`](Self::discover), also returning the entries that
    /// could not be walked. Only a failure on the root itself is fatal.
    fn walk(&self) -> GenResult<(Vec<PathBuf>, Vec<ScanError>)> {
        let root = &self.options.root;
        if !root.is_dir() {
            return Err(GenError::RootNotFound(root.clone()));
        }

        let output = fs::canonicalize(self.options.output_path()).ok();
        let mut files = Vec::new();
        let mut errors = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(GenError::Walk {
                        path: root.clone(),
                        source: err,
                    })
                }
                Err(err) => {
                    let path = err.path().unwrap_or(root.as_path()).to_path_buf();
                    warn!(file = %path.display(), error = %err, "Skipping unreadable entry");
                    errors.push(ScanError::new(
                        ScanErrorKind::FrontEnd,
                        err.to_string(),
                        SourceLocation::new(Arc::from(path.as_path()), 1, 1),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.is_source(path) || is_output(path, output.as_deref()) {
                continue;
            }

            let is_generated = path
                .file_name()
                .map(|name| name.to_string_lossy().contains(GENERATED_TAG))
                .unwrap_or(false);
            if is_generated {
                debug!(file = %path.display(), "Skipping generated file");
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        errors.sort_by(|a, b| a.location.file.cmp(&b.location.file));
        Ok((files, errors))
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.options.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    /// Scan every file and merge the partial results in input order
    pub fn scan(&self, files: &[PathBuf]) -> (MetadataStore, Vec<ScanError>) {
        let scans: Vec<FileScan> = if self.options.parallel {
            files.par_iter().map(|file| self.scan_file(file)).collect()
        } else {
            files.iter().map(|file| self.scan_file(file)).collect()
        };

        let mut metadata = MetadataStore::new();
        let mut errors = Vec::new();
        for scan in scans {
            metadata.merge(scan.metadata);
            errors.extend(scan.errors);
        }
        (metadata, errors)
    }

    fn scan_file(&self, file: &Path) -> FileScan {
        debug!(file = %file.display(), "Scanning");
        match self.frontend.parse(file, &self.options.include_dirs) {
            Ok(tree) => scan_tree(&tree, &self.options.root),
            Err(err) => {
                let mut scan = FileScan::new(file);
                scan.errors.push(ScanError::new(
                    ScanErrorKind::FrontEnd,
                    err.to_string(),
                    SourceLocation::new(Arc::from(file), 1, 1),
                ));
                scan
            }
        }
    }
}

/// Whether `path` is the existing output file, however either path is spelled
fn is_output(path: &Path, output: Option<&Path>) -> bool {
    let Some(output) = output else {
        return false;
    };
    if path.file_name() != output.file_name() {
        return false;
    }
    fs::canonicalize(path)
        .map(|path| path == output)
        .unwrap_or(false)
}
