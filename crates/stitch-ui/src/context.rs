// crates/stitch-ui/src/context.rs
//
// AppContext owns every runtime handle the controller needs. StitchApp holds
// one of these plus the current Stage and the view modules, nothing else.
//
//   AppContext
//     ├── store     the injected settings store (JSON file in the data dir)
//     ├── config    loaded once at startup
//     ├── readiness set on the first frame, awaited by the workflow
//     ├── picker    workflow side of the folder prompt channel
//     ├── prompts   UI side of the same channel
//     ├── workflow  the running workflow, if any
//     └── playback  decode thread for the built timeline, if any

use std::path::Path;
use std::sync::Arc;

use stitch_core::config::Config;
use stitch_core::latch::Readiness;
use stitch_core::settings::{JsonFileStore, SettingsStore, DIRECTORY_TOKEN_KEY};
use stitch_core::timeline::Timeline;
use stitch_core::WorkflowError;
use stitch_media::{
    prompt_channel, spawn_workflow, BuildOptions, ChannelPicker, FfmpegProbe, PlaybackSession,
    PromptServer, SampleBundle, WorkflowDeps, WorkflowHandle,
};

use crate::paths;

pub struct AppContext {
    pub store:     Arc<dyn SettingsStore>,
    pub config:    Config,
    pub readiness: Readiness,
    picker:        Arc<ChannelPicker>,
    pub prompts:   PromptServer,
    pub workflow:  Option<WorkflowHandle>,
    pub playback:  Option<PlaybackSession>,
}

impl AppContext {
    pub fn new(store: Arc<dyn SettingsStore>, config: Config) -> Self {
        let (picker, prompts) = prompt_channel();
        Self {
            store,
            config,
            readiness: Readiness::new(),
            picker:    Arc::new(picker),
            prompts,
            workflow:  None,
            playback:  None,
        }
    }

    /// Store and config from the app data directory.
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let config = Config::load(&paths::config_path(data_dir));
        let store  = JsonFileStore::open(paths::settings_path(data_dir));
        tracing::info!("[app] settings at {}", store.path().display());
        Self::new(Arc::new(store), config)
    }

    fn deps(&self) -> WorkflowDeps {
        let samples = self.config.resolve_samples_dir();
        tracing::info!("[app] sample bundle at {}", samples.display());
        WorkflowDeps {
            store:     Arc::clone(&self.store),
            picker:    Arc::clone(&self.picker),
            probe:     Arc::new(FfmpegProbe::new()),
            readiness: self.readiness.clone(),
            bundle:    SampleBundle::new(samples, self.config.sample_extension.clone()),
            options:   BuildOptions::from(&self.config),
        }
    }

    /// Cancels whatever is running and starts a fresh workflow.
    pub fn start_workflow(&mut self) {
        self.stop_playback();
        if let Some(old) = self.workflow.take() {
            old.cancel();
        }
        self.workflow = Some(spawn_workflow(self.deps()));
    }

    /// Forgets the chosen folder so the next workflow prompts again.
    pub fn forget_directory(&self) -> Result<(), WorkflowError> {
        self.store.remove(DIRECTORY_TOKEN_KEY)
    }

    pub fn start_playback(&mut self, timeline: Timeline) {
        self.stop_playback();
        self.playback = Some(PlaybackSession::start(timeline));
    }

    pub fn stop_playback(&mut self) {
        if let Some(session) = self.playback.take() {
            session.shutdown();
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(workflow) = self.workflow.take() {
            workflow.cancel();
        }
        self.stop_playback();
    }
}
