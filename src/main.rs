// SPDX-License-Identifier: MPL-2.0

//! Terminal front-end: one deck column, driven by single-key commands.
//!
//! Type keys and press enter. `j`/`k` move, `l` likes, `t` reposts, space
//! pages down, `o` opens the post in a browser, `n` fetches the next page,
//! `p` shows the selected author's profile, `f` follows or unfollows the
//! last shown profile, `m` lists conversations, `z`/`s` toggle zen and
//! streamer mode, `q` quits.

use skydeck::atproto::{Profile, SkyClient};
use skydeck::config::{APP_NAME, DEFAULT_PDS, ENV_APP_PASSWORD, ENV_HANDLE, ENV_PDS};
use skydeck::feed::mutations::spawn_worker;
use skydeck::feed::{
    Command, Effect, FeedSource, Mutation, MutationQueue, PageRequest, Timeline, load_page,
};
use skydeck::render::{ProfileTab, StoreContext, TextHost, render_conversations, render_profile};
use skydeck::state::SettingsStore;
use skydeck::{logging, runtime};
use std::error::Error;
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut store = SettingsStore::load();

    let handle = std::env::var(ENV_HANDLE).map_err(|_| format!("{ENV_HANDLE} is not set"))?;
    let password =
        std::env::var(ENV_APP_PASSWORD).map_err(|_| format!("{ENV_APP_PASSWORD} is not set"))?;
    let service = std::env::var(ENV_PDS).unwrap_or_else(|_| DEFAULT_PDS.to_string());

    let client = Arc::new(SkyClient::with_service(&service));
    let session = runtime::block_on(client.login(&handle, &password))?;
    info!(app = APP_NAME, handle = %session.handle, "ready");

    let (queue, mutations) = MutationQueue::channel();
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel();
    let _worker = spawn_worker(Arc::clone(&client), mutations, outcome_tx);

    let follows = queue.clone();
    let mut timeline = Timeline::new(FeedSource::for_column(store.settings(), 0), queue);
    let mut profile: Option<Profile> = None;
    let first = timeline.first_page();
    fetch(&client, &mut timeline, &first);
    show_selected(&store, &timeline);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        for key in line.chars() {
            while let Ok(outcome) = outcomes.try_recv() {
                timeline.apply_outcome(&outcome);
                if let Some(profile) = profile.as_mut() {
                    outcome.apply_to_profile(profile);
                }
            }

            match key {
                'q' => return Ok(()),
                'n' => match timeline.end_reached() {
                    Some(request) => fetch(&client, &mut timeline, &request),
                    None => info!("no more pages"),
                },
                'p' => profile = show_profile(&client, &store, &timeline),
                'f' => match &profile {
                    Some(profile) => follows.push(Mutation::toggle_follow(profile)),
                    None => info!("no profile shown"),
                },
                'm' => show_conversations(&client, &store, &session.did),
                'z' => {
                    store.update(|s| s.experiments.zen_mode = !s.experiments.zen_mode)?;
                }
                's' => {
                    store.update(|s| s.experiments.streamer_mode = !s.experiments.streamer_mode)?;
                }
                key => {
                    let Some(command) = Command::from_key(key) else {
                        continue;
                    };
                    match timeline.handle(command) {
                        Some(Effect::Open(url)) => {
                            if let Err(e) = open::that(&url) {
                                warn!(%url, error = %e, "failed to open browser");
                            }
                        }
                        Some(Effect::ScrollIntoView(_)) | None => {}
                    }
                    // Reaching the end pulls the next page in.
                    if timeline.at_end() {
                        if let Some(request) = timeline.end_reached() {
                            fetch(&client, &mut timeline, &request);
                        }
                    }
                }
            }
        }
        show_selected(&store, &timeline);
    }

    Ok(())
}

fn fetch(client: &SkyClient, timeline: &mut Timeline, request: &PageRequest) {
    match runtime::block_on(load_page(client, request)) {
        Ok(page) => timeline.receive_page(page),
        Err(e) => timeline.receive_error(e.to_string()),
    }
}

fn host(store: &SettingsStore) -> TextHost {
    TextHost::new(store.settings().experiments.dev_mode)
}

fn show_selected(store: &SettingsStore, timeline: &Timeline) {
    let ctx = StoreContext::new(store);
    print!("{}", host(store).render(&timeline.render_selected(&ctx)));
}

fn show_profile(client: &SkyClient, store: &SettingsStore, timeline: &Timeline) -> Option<Profile> {
    let item = timeline.selected()?;
    let actor = item.post.author.did.clone();

    let profile = match runtime::block_on(client.get_profile(&actor)) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(%actor, error = %e, "failed to load profile");
            None
        }
    };
    let feed = runtime::block_on(client.get_author_feed(&actor, None))
        .map(|page| page.posts)
        .unwrap_or_else(|e| {
            warn!(%actor, error = %e, "failed to load author feed");
            Vec::new()
        });

    let ctx = StoreContext::new(store);
    let node = render_profile(profile.as_ref(), ProfileTab::default(), &feed, &ctx);
    print!("{}", host(store).render(&node));
    profile
}

fn show_conversations(client: &SkyClient, store: &SettingsStore, session_did: &str) {
    let ctx = StoreContext::new(store);
    let node = match runtime::block_on(client.get_conversations(None)) {
        Ok((convos, _cursor)) => render_conversations(&convos, session_did, &ctx),
        Err(e) => {
            warn!(error = %e, "failed to load conversations");
            skydeck::render::RenderNode::Text(e.to_string())
        }
    };
    print!("{}", host(store).render(&node));
}
