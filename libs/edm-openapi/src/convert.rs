//! One conversion run: settings check, path enumeration, parallel synthesis.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use edm_model::{EdmModel, ModelId};
use rayon::prelude::*;

use crate::cache::AnnotationCache;
use crate::capabilities::DecodeIssue;
use crate::config::ConvertSettings;
use crate::error::ConvertError;
use crate::paths::{ODataPath, PathTreeBuilder};
use crate::resolver::RestrictionResolver;
use crate::synth::{OperationDescriptor, OperationSynthesizer};

/// Output of a run: the path set and, grouped by path in path order, the
/// operations synthesized for it.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub model: ModelId,
    pub paths: Vec<Arc<ODataPath>>,
    pub operations: Vec<OperationDescriptor>,
    /// Malformed annotation fields met while resolving restrictions.
    pub issues: Vec<DecodeIssue>,
    /// Slice of `operations` belonging to `paths[i]`.
    spans: Vec<Range<usize>>,
    /// Template to position in `paths`.
    index: HashMap<String, usize>,
}

impl Conversion {
    fn new(
        model: ModelId,
        paths: Vec<Arc<ODataPath>>,
        groups: Vec<Vec<OperationDescriptor>>,
        issues: Vec<DecodeIssue>,
    ) -> Self {
        let mut operations = Vec::with_capacity(groups.iter().map(Vec::len).sum());
        let mut spans = Vec::with_capacity(groups.len());
        for group in groups {
            let start = operations.len();
            operations.extend(group);
            spans.push(start..operations.len());
        }
        let index = paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path.template().to_owned(), i))
            .collect();
        Self {
            model,
            paths,
            operations,
            issues,
            spans,
            index,
        }
    }

    /// Operations synthesized for `path`; empty when this run did not
    /// produce its template.
    #[must_use]
    pub fn operations_for(&self, path: &ODataPath) -> &[OperationDescriptor] {
        self.index
            .get(path.template())
            .and_then(|&i| self.group(i))
            .unwrap_or_default()
    }

    /// Paths in order, each with its operations.
    pub fn by_path(&self) -> impl Iterator<Item = (&Arc<ODataPath>, &[OperationDescriptor])> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, path)| (path, self.group(i).unwrap_or_default()))
    }

    fn group(&self, i: usize) -> Option<&[OperationDescriptor]> {
        self.operations.get(self.spans.get(i)?.clone())
    }

    /// Path with the given URL template, if produced.
    #[must_use]
    pub fn path(&self, template: &str) -> Option<&Arc<ODataPath>> {
        self.index.get(template).and_then(|&i| self.paths.get(i))
    }
}

/// Converter reusable across models; its cache follows the model it is
/// given.
#[derive(Default)]
pub struct Converter {
    settings: ConvertSettings,
    cache: AnnotationCache,
}

impl Converter {
    #[must_use]
    pub fn new(settings: ConvertSettings) -> Self {
        Self {
            settings,
            cache: AnnotationCache::new(),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    #[must_use]
    pub const fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    /// Runs the full conversion of `model`.
    ///
    /// # Errors
    /// Returns `ConvertError::Config` when the settings are invalid; nothing
    /// is computed in that case.
    pub fn convert(&self, model: &EdmModel) -> Result<Conversion, ConvertError> {
        let paths = PathTreeBuilder::new(model, &self.settings).build()?;
        tracing::debug!(model = %model.id(), paths = paths.len(), "path tree built");

        let synthesizer = OperationSynthesizer::new(RestrictionResolver::new(model, &self.cache));
        let groups: Vec<Vec<OperationDescriptor>> = paths
            .par_iter()
            .map(|path| synthesizer.synthesize(path))
            .collect();

        let conversion = Conversion::new(model.id(), paths, groups, self.cache.issues());
        tracing::info!(
            model = %model.id(),
            paths = conversion.paths.len(),
            operations = conversion.operations.len(),
            issues = conversion.issues.len(),
            "conversion finished"
        );
        Ok(conversion)
    }
}

/// Converts `model` with a fresh cache.
///
/// # Errors
/// See [`Converter::convert`].
pub fn convert(model: &EdmModel, settings: &ConvertSettings) -> Result<Conversion, ConvertError> {
    Converter::new(settings.clone()).convert(model)
}
