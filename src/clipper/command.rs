//! Clip command execution: extract, ingest and fetch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::{
    ClipAssembler, ClipRequest, IdAllocator, IdScheme, Selection, normalize_species_code,
    parse_manifest,
};
use crate::audio::{AudioBuffer, decode_audio_bytes, decode_audio_file};
use crate::catalog::{Catalog, CatalogStore, ClipMetadata, MergeReport};
use crate::cli::{ExtractArgs, FetchArgs, IngestArgs};
use crate::config::{Config, PipelineSettings, ProjectLayout};
use crate::constants::xenocanto::SOURCE_NAME;
use crate::error::{Error, Result};
use crate::output::BatchSummary;
use crate::output::progress::{create_item_progress, finish_progress, inc_progress, set_progress_message};
use crate::sources::xenocanto::XenoCantoClient;
use crate::spectrogram::{NoSpectrogram, PngSpectrogram, SpectrogramRenderer};

/// Execute the extract command.
///
/// Returns the new clip, which has also been appended to the catalog.
pub fn extract(args: &ExtractArgs, config: &Config, layout: &ProjectLayout) -> Result<ClipMetadata> {
    let settings = &config.pipeline;
    settings.duration_bounds().validate(args.duration)?;
    let species_code = normalize_species_code(&args.species)?;

    let store = CatalogStore::new(layout.catalog_path());
    let _lock = store.lock()?;
    let mut catalog = store.load()?;

    let common_name = match &args.common_name {
        Some(name) => name.clone(),
        None => catalog
            .common_name_for(&species_code)
            .map(ToString::to_string)
            .ok_or_else(|| Error::ConfigValidation {
                message: format!(
                    "no common name known for {species_code}; pass --common-name"
                ),
            })?,
    };

    let request = ClipRequest {
        species_code,
        common_name,
        vocalization_type: args.vocalization_type,
        quality_score: args.quality,
        source: args.source.clone(),
        source_id: args.source_id.clone(),
        source_url: args.source_url.clone(),
        recordist: args.recordist.clone(),
        source_file: file_name(&args.input),
        selection: Selection::Manual {
            start_secs: args.start,
            duration_secs: args.duration,
        },
        id_scheme: IdScheme::Sequential,
    };
    request.validate(&settings.duration_bounds())?;

    let source = decode_audio_file(&args.input)?;
    let png = PngSpectrogram::default();
    let assembler = ClipAssembler::new(settings, layout, renderer(settings, &png));
    let mut ids = IdAllocator::new(catalog.ids());
    let mut clips = assembler.assemble(source, &request, &mut ids)?;

    commit_clips(&store, &mut catalog, clips.clone(), layout)?;
    clips.pop().ok_or_else(|| Error::Internal {
        message: "manual selection produced no clip".to_string(),
    })
}

/// Execute the ingest command.
pub fn ingest(
    args: &IngestArgs,
    config: &Config,
    layout: &ProjectLayout,
    progress: bool,
) -> Result<BatchSummary> {
    let settings = &config.pipeline;
    let entries = parse_manifest(&args.manifest)?;
    let selection = selection(settings, args.multi, args.window)?;
    info!(
        "Ingesting {} recording(s) from {}",
        entries.len(),
        args.manifest.display()
    );

    let store = CatalogStore::new(layout.catalog_path());
    let _lock = store.lock()?;
    let png = PngSpectrogram::default();
    let mut batch = Batch::new(
        ClipAssembler::new(settings, layout, renderer(settings, &png)),
        store.load()?,
    );

    let pb = create_item_progress(entries.len(), "recordings", progress);
    for entry in entries {
        let label = entry.file.display().to_string();
        set_progress_message(pb.as_ref(), &label);

        if let Some(source_id) = &entry.source_id
            && batch.catalog.has_source(&entry.source, source_id)
        {
            info!("Skipping {label}: {source_id} is already in the catalog");
            batch.summary.record_skip();
            inc_progress(pb.as_ref());
            continue;
        }

        let request = ClipRequest {
            species_code: entry.species_code,
            common_name: entry.common_name,
            vocalization_type: entry.vocalization_type,
            quality_score: entry.quality_score,
            source: entry.source,
            source_id: entry.source_id,
            source_url: None,
            recordist: entry.recordist,
            source_file: file_name(&entry.file),
            selection,
            id_scheme: IdScheme::ContentHash,
        };
        batch.process(&label, decode_audio_file(&entry.file), &request);
        inc_progress(pb.as_ref());
    }
    finish_progress(pb, "Ingest complete");

    batch.finish(&store, layout, "Ingest")
}

/// Execute the fetch command.
pub fn fetch(
    args: &FetchArgs,
    config: &Config,
    layout: &ProjectLayout,
    progress: bool,
) -> Result<BatchSummary> {
    let settings = &config.pipeline;
    let selection = selection(settings, args.multi, args.window)?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.xenocanto.api_key.clone())
        .ok_or(Error::MissingApiKey)?;
    let client = XenoCantoClient::new(&config.xenocanto, api_key)?;
    let max_per_species = args
        .max_per_species
        .unwrap_or(config.xenocanto.max_per_species);

    let runtime = Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    let store = CatalogStore::new(layout.catalog_path());
    let _lock = store.lock()?;
    let png = PngSpectrogram::default();
    let mut batch = Batch::new(
        ClipAssembler::new(settings, layout, renderer(settings, &png)),
        store.load()?,
    );
    let mut pacer = Pacer::new(client.delay());

    let pb = create_item_progress(args.species.len(), "species", progress);
    for target in &args.species {
        set_progress_message(pb.as_ref(), &target.common_name);

        pacer.wait(&runtime);
        let recordings = match runtime.block_on(client.search(&target.common_name)) {
            Ok(recordings) => recordings,
            Err(e) => {
                warn!("Search for {} failed: {e}", target.common_name);
                batch.summary.record_failure();
                inc_progress(pb.as_ref());
                continue;
            }
        };

        let fresh: Vec<_> = recordings
            .into_iter()
            .filter(|r| !batch.catalog.has_source(SOURCE_NAME, &r.source_id()))
            .take(max_per_species)
            .collect();
        if fresh.is_empty() {
            info!("No new recordings for {}", target.common_name);
            batch.summary.record_skip();
        }

        for recording in fresh {
            let label = format!("{} ({})", recording.source_id(), target.common_name);
            pacer.wait(&runtime);
            let source = runtime
                .block_on(client.download(&recording))
                .and_then(|bytes| {
                    decode_audio_bytes(
                        bytes,
                        Some(recording.extension()),
                        &recording.download_url(),
                    )
                });
            let request = ClipRequest {
                species_code: target.species_code.clone(),
                common_name: target.common_name.clone(),
                vocalization_type: recording.vocalization_type(),
                quality_score: recording.quality_score(),
                source: SOURCE_NAME.to_string(),
                source_id: Some(recording.source_id()),
                source_url: Some(recording.source_url()),
                recordist: Some(recording.rec.trim().to_string()).filter(|r| !r.is_empty()),
                source_file: recording.source_file(),
                selection,
                id_scheme: IdScheme::ContentHash,
            };
            batch.process(&label, source, &request);
        }
        inc_progress(pb.as_ref());
    }
    finish_progress(pb, "Fetch complete");

    batch.finish(&store, layout, "Fetch")
}

/// Clips accumulated over a batch, committed to the catalog once at the end.
struct Batch<'a> {
    assembler: ClipAssembler<'a>,
    catalog: Catalog,
    ids: IdAllocator,
    produced: Vec<ClipMetadata>,
    summary: BatchSummary,
}

impl<'a> Batch<'a> {
    fn new(assembler: ClipAssembler<'a>, catalog: Catalog) -> Self {
        let ids = IdAllocator::new(catalog.ids());
        Self {
            assembler,
            catalog,
            ids,
            produced: Vec::new(),
            summary: BatchSummary::default(),
        }
    }

    /// Run one item. Failures are logged and counted, never propagated.
    fn process(&mut self, label: &str, source: Result<AudioBuffer>, request: &ClipRequest) {
        let result =
            source.and_then(|buffer| self.assembler.assemble(buffer, request, &mut self.ids));
        match result {
            Ok(clips) => {
                self.summary.record_success(clips.len());
                self.produced.extend(clips);
            }
            Err(Error::DuplicateClipId { id }) => {
                info!("Skipping {label}: clip {id} already exists");
                self.summary.record_skip();
            }
            Err(e) => {
                warn!("Failed to process {label}: {e}");
                self.summary.record_failure();
            }
        }
    }

    fn finish(mut self, store: &CatalogStore, layout: &ProjectLayout, label: &str) -> Result<BatchSummary> {
        if !self.produced.is_empty() {
            let produced = std::mem::take(&mut self.produced);
            commit_clips(store, &mut self.catalog, produced, layout)?;
        }
        self.summary.log(label);
        self.summary.into_result()
    }
}

/// Enforces the pause between remote requests.
struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: false,
        }
    }

    fn wait(&mut self, runtime: &Runtime) {
        if self.started && !self.delay.is_zero() {
            runtime.block_on(tokio::time::sleep(self.delay));
        }
        self.started = true;
    }
}

/// Append written clips to the catalog and save it. On failure the clips'
/// files are removed again.
fn commit_clips(
    store: &CatalogStore,
    catalog: &mut Catalog,
    clips: Vec<ClipMetadata>,
    layout: &ProjectLayout,
) -> Result<MergeReport> {
    let written: Vec<PathBuf> = clips
        .iter()
        .flat_map(|c| std::iter::once(&c.file_path).chain(c.spectrogram_path.as_ref()))
        .map(|p| layout.resolve(p))
        .collect();

    let before = catalog.len();
    let result = match catalog.merge(clips) {
        Ok(added) => store.save(catalog).map(|()| added),
        Err(e) => Err(e),
    };

    match result {
        Ok(added) => Ok(MergeReport {
            before,
            added,
            after: catalog.len(),
        }),
        Err(e) => {
            for path in &written {
                if let Err(remove_err) = fs::remove_file(path) {
                    warn!("Failed to remove {}: {remove_err}", path.display());
                }
            }
            Err(e)
        }
    }
}

fn selection(settings: &PipelineSettings, multi: bool, window: Option<f64>) -> Result<Selection> {
    if !multi {
        return Ok(Selection::Auto);
    }
    let window_secs = window.unwrap_or(settings.segment_window_secs);
    settings.duration_bounds().validate(window_secs)?;
    Ok(Selection::Distinct { window_secs })
}

fn renderer<'a>(
    settings: &PipelineSettings,
    png: &'a PngSpectrogram,
) -> &'a dyn SpectrogramRenderer {
    if settings.spectrograms {
        png
    } else {
        &NoSpectrogram
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned()
}
