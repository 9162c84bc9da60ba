//! Bike Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, HtmlInputElement,
        KeyboardEvent, Request, RequestInit, RequestMode, Response, TouchEvent,
    };

    use bike_dash::assets::{IMAGE_SOURCES, SpriteImage};
    use chrono::Utc;

    use bike_dash::leaderboard::{
        self, ApiResponse, ClientError, InProcessTransport, LeaderboardClient, LocalRankingStore,
        RankingsApi, Ticket, response_from_text, server_missing,
    };
    use bike_dash::persistence::{self, KeyValueStore};
    use bike_dash::platform::scope::web::{listen, request_frame};
    use bike_dash::platform::{Command, FrameSlot, InputEvent, InputMapper, Key, ListenerSet, dispatch};
    use bike_dash::renderer::build_frame;
    use bike_dash::renderer::canvas::CanvasPainter;
    use bike_dash::sim::{CollisionService, Session};
    use bike_dash::{ImageRegistry, Settings, Tuning};

    const RANKINGS_URL: &str = "/api/rankings";

    type LocalRankings = InProcessTransport<LocalRankingStore<Box<dyn KeyValueStore>>>;

    thread_local! {
        static HOST: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        images: ImageRegistry,
        painter: CanvasPainter,
        input: InputMapper,
        settings: Settings,
        storage: Box<dyn KeyValueStore>,
        leaderboard: LeaderboardClient,
        /// Browser-local board, opened once the server turns out to be missing
        local_rankings: Option<LocalRankings>,
        /// DOM listeners, released on teardown
        listeners: ListenerSet,
        /// Pending animation frame while the loop runs
        frame: FrameSlot,
    }

    impl Game {
        fn new(ctx: CanvasRenderingContext2d, seed: u64) -> Self {
            let storage = persistence::default_storage();
            let settings = Settings::load(storage.as_ref());
            let session = Session::new(
                Tuning::default(),
                CollisionService::new(settings.pixel_perfect),
                seed,
            );
            Self {
                session,
                images: ImageRegistry::new(),
                painter: CanvasPainter::new(ctx),
                input: InputMapper::new(),
                settings,
                storage,
                leaderboard: LeaderboardClient::new(),
                local_rankings: None,
                listeners: ListenerSet::new(),
                frame: FrameSlot::new(),
            }
        }

        fn render(&self) {
            let list = build_frame(&self.session, &self.images, &self.settings);
            if let Err(e) = self.painter.paint(&list) {
                log::warn!("Render error: {:?}", e);
            }
        }

        /// Apply a command; returns true when a run just began
        fn handle(&mut self, command: Command) -> bool {
            let was_running = self.session.is_running();
            dispatch(&mut self.session, command, js_sys::Date::now() as u64);
            let started = !was_running && self.session.is_running();
            if started {
                self.input.reset();
                self.leaderboard.reset_for_run();
                show_ranking(false);
            }
            started
        }

        fn stop_loop(&mut self) {
            self.frame.stop();
            self.input.reset();
        }

        fn teardown(&mut self) {
            self.stop_loop();
            self.leaderboard.detach();
            self.listeners.clear();
            log::info!("Bike Dash stopped");
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Bike Dash starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        canvas.set_width(bike_dash::consts::GAME_WIDTH as u32);
        canvas.set_height(bike_dash::consts::GAME_HEIGHT as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(ctx, seed)));
        log::info!("Game initialized with seed: {}", seed);

        if let Some(input) = name_input(&document) {
            input.set_max_length(leaderboard::NAME_INPUT_CHARS as i32);
            input.set_value(&game.borrow().settings.player_name);
        }

        if let Err(e) = load_images(&document, &game) {
            log::warn!("Image setup failed: {:?}", e);
        }
        if let Err(e) = setup_input_handlers(&window, &canvas, &document, &game) {
            log::error!("Input setup failed: {:?}", e);
        }

        game.borrow().render();
        HOST.with(|host| *host.borrow_mut() = Some(game));

        log::info!("Bike Dash ready!");
    }

    /// Release every listener and the pending frame
    pub fn stop() {
        if let Some(game) = HOST.with(|host| host.borrow_mut().take()) {
            game.borrow_mut().teardown();
        }
    }

    fn name_input(document: &Document) -> Option<HtmlInputElement> {
        document
            .get_element_by_id("player-name")
            .and_then(|el| el.dyn_into().ok())
    }

    fn load_images(document: &Document, game: &Rc<RefCell<Game>>) -> Result<(), JsValue> {
        for (name, src) in IMAGE_SOURCES {
            let img = HtmlImageElement::new()?;

            let on_load = {
                let game = game.clone();
                let loaded = img.clone();
                let document = document.clone();
                listen(&img, "load", move |_: web_sys::Event| {
                    let mut g = game.borrow_mut();
                    match decode_image(&document, &loaded) {
                        Ok(sprite) => {
                            g.painter.add_image(name, loaded.clone());
                            g.images.insert(name, sprite);
                        }
                        Err(e) => {
                            log::warn!("Could not read pixels of {}: {:?}", name, e);
                            g.images.mark_failed(name);
                        }
                    }
                    if !g.session.is_running() {
                        g.render();
                    }
                })?
            };
            let on_error = {
                let game = game.clone();
                listen(&img, "error", move |_: web_sys::Event| {
                    game.borrow_mut().images.mark_failed(name);
                })?
            };

            let mut g = game.borrow_mut();
            g.listeners.add(on_load);
            g.listeners.add(on_error);
            img.set_src(src);
        }
        Ok(())
    }

    /// Draw the image once onto an offscreen canvas and read back RGBA
    fn decode_image(document: &Document, img: &HtmlImageElement) -> Result<SpriteImage, JsValue> {
        let (w, h) = (img.natural_width(), img.natural_height());
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_width(w);
        canvas.set_height(h);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?;
        let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?;
        SpriteImage::from_rgba(w, h, data.data().0).ok_or_else(|| JsValue::from_str("pixel buffer size mismatch"))
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        document: &Document,
        game: &Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        let mut subs = Vec::new();

        // Keyboard
        {
            let game = game.clone();
            subs.push(listen(window, "keydown", move |event: KeyboardEvent| {
                let key = Key::from_code(&event.code());
                if key.prevents_default() {
                    event.prevent_default();
                }
                let input = InputEvent::KeyDown {
                    key,
                    repeat: event.repeat(),
                };
                on_input(&game, input, event.time_stamp());
            })?);
        }
        {
            let game = game.clone();
            subs.push(listen(window, "keyup", move |event: KeyboardEvent| {
                let key = Key::from_code(&event.code());
                if key.prevents_default() {
                    event.prevent_default();
                }
                on_input(&game, InputEvent::KeyUp { key }, event.time_stamp());
            })?);
        }

        // Touch
        {
            let game = game.clone();
            subs.push(listen(canvas, "touchstart", move |event: TouchEvent| {
                event.prevent_default();
                on_input(&game, InputEvent::TouchStart, event.time_stamp());
            })?);
        }
        {
            let game = game.clone();
            subs.push(listen(canvas, "touchend", move |event: TouchEvent| {
                event.prevent_default();
                on_input(&game, InputEvent::TouchEnd, event.time_stamp());
            })?);
        }

        // Buttons
        let buttons: [(&str, Option<Command>); 3] = [
            ("jump-button", None),
            ("start-button", Some(Command::Start)),
            ("restart-button", Some(Command::Restart)),
        ];
        for (id, command) in buttons {
            let Some(el) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            subs.push(listen(&el, "click", move |event: web_sys::Event| match command {
                Some(command) => run_command(&game, command),
                None => on_input(&game, InputEvent::JumpButton, event.time_stamp()),
            })?);
        }
        if let Some(el) = document.get_element_by_id("submit-score") {
            let game = game.clone();
            subs.push(listen(&el, "click", move |_: web_sys::Event| submit_score(&game))?);
        }

        // Stop the loop when the page goes away
        {
            let game = game.clone();
            subs.push(listen(window, "pagehide", move |_: web_sys::Event| {
                let mut g = game.borrow_mut();
                g.stop_loop();
                g.leaderboard.detach();
            })?);
        }
        // A page restored from the back/forward cache comes back mid-run
        {
            let game = game.clone();
            subs.push(listen(window, "pageshow", move |_: web_sys::Event| {
                let resume = {
                    let g = game.borrow();
                    g.frame.needs_resume(g.session.is_running())
                };
                if resume {
                    log::info!("Resuming run after page restore");
                    schedule_frame(game.clone());
                }
            })?);
        }

        let mut g = game.borrow_mut();
        for sub in subs {
            g.listeners.add(sub);
        }
        Ok(())
    }

    fn on_input(game: &Rc<RefCell<Game>>, event: InputEvent, at_ms: f64) {
        let command = {
            let mut g = game.borrow_mut();
            let phase = g.session.phase();
            g.input.map(event, at_ms, phase)
        };
        if let Some(command) = command {
            run_command(game, command);
        }
    }

    fn run_command(game: &Rc<RefCell<Game>>, command: Command) {
        let started = game.borrow_mut().handle(command);
        if started {
            schedule_frame(game.clone());
        }
    }

    fn schedule_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = {
            let game = game.clone();
            Closure::once_into_js(move |_time: f64| game_loop(game))
        };
        match request_frame(&window, &callback) {
            Ok(sub) => game.borrow_mut().frame.set(sub),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        let ended = {
            let mut g = game.borrow_mut();
            if g.frame.take().is_none() {
                // Loop was stopped while this frame was queued
                return;
            }
            let g = &mut *g;
            g.session.frame(&g.images);
            g.render();

            let ended = g.session.has_ended();
            if ended {
                g.stop_loop();
            }
            ended
        };

        if ended {
            on_run_ended(&game);
        } else {
            schedule_frame(game);
        }
    }

    fn on_run_ended(game: &Rc<RefCell<Game>>) {
        let (ticket, score) = {
            let mut g = game.borrow_mut();
            let score = g.session.final_score().unwrap_or(0);
            (g.leaderboard.begin_fetch(), score)
        };
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Some(el) = document.get_element_by_id("final-score") {
                el.set_text_content(Some(&score.to_string()));
            }
        }
        show_ranking(true);
        refresh_ranking(game);
        fetch_rankings(game.clone(), ticket);
    }

    fn fetch_rankings(game: Rc<RefCell<Game>>, ticket: Ticket) {
        wasm_bindgen_futures::spawn_local(async move {
            let result = rankings_request(&game, None).await;
            let applied = game.borrow_mut().leaderboard.complete_fetch(ticket, result);
            if applied {
                refresh_ranking(&game);
            }
        });
    }

    fn submit_score(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let name = name_input(&document).map(|i| i.value()).unwrap_or_default();

        let request = {
            let mut g = game.borrow_mut();
            if g.leaderboard.view().submitted || g.leaderboard.view().submitting {
                return;
            }
            let score = g.session.final_score().unwrap_or(0);
            match g.leaderboard.begin_submit(&name, score) {
                Ok(request) => {
                    g.settings.remember_name(&name);
                    let settings = g.settings.clone();
                    if let Err(e) = settings.save(g.storage.as_mut()) {
                        log::warn!("Could not save settings: {}", e);
                    }
                    request
                }
                Err(e) => {
                    log::debug!("Submission not sent: {}", e);
                    return;
                }
            }
        };
        refresh_ranking(game);

        let (ticket, body) = request;
        let game = game.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = rankings_request(&game, Some(body)).await;
            let stored = game.borrow_mut().leaderboard.complete_submit(ticket, result);
            if stored.is_some() {
                let ticket = game.borrow_mut().leaderboard.begin_fetch();
                fetch_rankings(game.clone(), ticket);
            }
            refresh_ranking(&game);
        });
    }

    /// Send a leaderboard request to the server, or to the local board when there is none
    async fn rankings_request(
        game: &Rc<RefCell<Game>>,
        body: Option<String>,
    ) -> Result<ApiResponse, ClientError> {
        if game.borrow().local_rankings.is_none() {
            let method = if body.is_some() { "POST" } else { "GET" };
            let result = http(method, body.clone()).await;
            if !server_missing(&result) {
                return result;
            }
            log::warn!("No leaderboard server, keeping rankings in this browser");
        }

        let mut g = game.borrow_mut();
        let local = g.local_rankings.get_or_insert_with(|| {
            let store = LocalRankingStore::open_seeded(persistence::default_storage(), Utc::now());
            InProcessTransport::new(RankingsApi::new(store))
        });
        match body {
            Some(body) => local.submit(&body, Utc::now()),
            None => local.fetch(),
        }
    }

    async fn http(method: &str, body: Option<String>) -> Result<ApiResponse, ClientError> {
        let window = web_sys::window().ok_or_else(|| ClientError::Transport("no window".into()))?;
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::SameOrigin);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(RANKINGS_URL, &opts).map_err(js_error)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error)?;

        let resp: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        let text = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        response_from_text(resp.status(), &text)
    }

    fn js_error(e: JsValue) -> ClientError {
        ClientError::Transport(format!("{:?}", e))
    }

    fn show_ranking(visible: bool) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("ranking"))
        else {
            return;
        };
        let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
    }

    /// Rewrite the ranking screen from the client view
    fn refresh_ranking(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let g = game.borrow();
        let view = g.leaderboard.view();
        let score = g.session.final_score().unwrap_or(0);

        if let Some(list) = document.get_element_by_id("ranking-list") {
            list.set_text_content(None);
            for (i, entry) in view.entries.iter().take(leaderboard::DISPLAY_LIMIT).enumerate() {
                if let Ok(li) = document.create_element("li") {
                    li.set_text_content(Some(&format!("{}. {} - {}", i + 1, entry.name, entry.score)));
                    let _ = list.append_child(&li);
                }
            }
        }

        let status = if view.loading {
            "Loading rankings...".to_string()
        } else if let Some(notice) = &view.notice {
            notice.clone()
        } else if view.submitted {
            "Score saved!".to_string()
        } else if leaderboard::is_new_record(&view.entries, score) {
            "New record!".to_string()
        } else if leaderboard::can_submit(score) {
            format!("You would place #{}", leaderboard::potential_rank(&view.entries, score))
        } else {
            String::new()
        };
        if let Some(el) = document.get_element_by_id("ranking-notice") {
            el.set_text_content(Some(&status));
        }
        if let Some(el) = document.get_element_by_id("submit-score") {
            let disabled = view.submitted || view.submitting || !leaderboard::can_submit(score);
            let _ = if disabled {
                el.set_attribute("disabled", "")
            } else {
                el.remove_attribute("disabled")
            };
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Detach every listener and stop the loop
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop() {
    wasm_game::stop();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bike Dash (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - use the web build to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let tuning = match std::env::var("BIKE_DASH_TUNING") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| bike_dash::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => bike_dash::Tuning::default(),
    };

    let score = demo::run_headless(tuning, seed);
    demo::submit(score);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use chrono::Utc;
    use serde_json::json;

    use bike_dash::ImageRegistry;
    use bike_dash::leaderboard::{
        self, InProcessTransport, LeaderboardClient, LocalRankingStore, RankingsApi,
    };
    use bike_dash::persistence;
    use bike_dash::sim::{CollisionService, GameEvent, Session, SessionPhase};
    use bike_dash::{Tuning, consts};

    /// Two minutes of play at 60 ticks per second
    const MAX_TICKS: u64 = consts::TICKS_PER_SECOND as u64 * 120;

    /// Play one autopilot run and return its score
    pub fn run_headless(tuning: Tuning, seed: u64) -> u32 {
        let images = ImageRegistry::new();
        let mut session = Session::new(tuning, CollisionService::default(), seed);
        session.autopilot = true;
        session.start(seed);

        let mut jumps = 0u32;
        let mut pickups = 0u32;
        while session.is_running() && session.world().ticks < MAX_TICKS {
            for event in session.frame(&images) {
                match event {
                    GameEvent::Jumped { .. } => jumps += 1,
                    GameEvent::CollectiblePicked { .. } => pickups += 1,
                    _ => {}
                }
            }
        }

        let outcome = match session.phase() {
            SessionPhase::Ended { outcome, .. } => format!("{:?}", outcome),
            _ => "time limit".to_string(),
        };
        println!(
            "Run over ({}) after {} ticks: score {}, level {}, {} jumps, {} gloves",
            outcome,
            session.world().ticks,
            session.score(),
            session.level() + 1,
            jumps,
            pickups
        );
        session.score()
    }

    /// Submit the score to an in-process leaderboard and print the standings
    pub fn submit(score: u32) {
        let store = LocalRankingStore::open_seeded(persistence::default_storage(), Utc::now());
        let mut transport = InProcessTransport::new(RankingsApi::new(store));
        let mut client = LeaderboardClient::new();

        let ticket = client.begin_fetch();
        client.complete_fetch(ticket, transport.fetch());
        let entries = &client.view().entries;
        if leaderboard::is_new_record(entries, score) {
            println!("New record!");
        } else if leaderboard::can_submit(score) {
            println!("Would place #{}", leaderboard::potential_rank(entries, score));
        }

        match client.begin_submit("Autopilot", score) {
            Ok((ticket, body)) => {
                client.complete_submit(ticket, transport.submit(&body, Utc::now()));
            }
            Err(e) => println!("Score not submitted: {}", e),
        }

        // Rejected submissions never reach the store
        let rejected = transport.submit(&json!({ "name": "Zero", "score": 0 }).to_string(), Utc::now());
        if let Ok(resp) = rejected {
            log::debug!("Zero score rejected with {}", resp.status);
        }

        println!("\nTop {}:", leaderboard::DISPLAY_LIMIT);
        for (i, entry) in client
            .view()
            .entries
            .iter()
            .take(leaderboard::DISPLAY_LIMIT)
            .enumerate()
        {
            println!("{:>2}. {:<20} {:>6}", i + 1, entry.name, entry.score);
        }
    }
}
