use std::io::Write as _;
use std::path::Path;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use nexlyn_catalog::admin::{AccessRole, ProductDraft, SlideDraft};
use nexlyn_catalog::chat::{ChatBridge, ChatTransport, TurnOutcome};
use nexlyn_catalog::config::AppConfig;
use nexlyn_catalog::db::SqliteStore;
use nexlyn_catalog::gemini::GeminiClient;
use nexlyn_catalog::models::{ChatMessage, Product, Role, SiteSettings, SlideId};
use nexlyn_catalog::paths::clear_app_data;
use nexlyn_catalog::store::{CatalogStore, SyncStatus};
use nexlyn_catalog::storefront::{Storefront, View};
use nexlyn_catalog::upload::{acquire_image, CloudinaryUploader, ImageBlob};
use nexlyn_catalog::voice::{AudioClip, VoiceInput, VoiceOutcome, WhisperTranscriber};
use nexlyn_catalog::whatsapp::InquiryContext;

const HELP: &str = "\
Catalog
  list                     products in the current category/search
  featured                 featured products
  category <name>          filter by category (All, Routing, Switching, Wireless, 5G/LTE, IoT, Accessories)
  search <text>            filter by name or code
  counts                   products per category
  show <id>                product details and related products
  view <name>              home, products, detail, admin, about, contact
  banner                   current hero slide (click with `banner go`)
  theme                    toggle light/dark
  quote [id|category]      WhatsApp inquiry link
Assistant
  ask <text>               single answer
  stream <text>            answer printed as it arrives
                           (Ctrl-C abandons a pending answer)
  voice <audio-file>       transcribe, then send
  chat                     show transcript
Admin
  login <passcode> / logout
  admin [page]             paginated catalog
  overview                 owner summary
  add <name> | <code> | <category> | <specs> [| <status>]
  add-url <product-url> [| <category>]
  image <id> <file>        upload and attach an image
  delete <id>
  slides / slide-add <title> | <subtitle> | <image> [| <category>] / slide-delete <id>
  set <whatsapp|about|address|map> <value>
  reset                    delete all local data
  help / quit";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("[init] Using default config: {}", e);
        AppConfig::default()
    });

    let backend = match SqliteStore::open_default() {
        Ok(backend) => backend,
        Err(e) => {
            warn!("[init] Durable store unavailable, changes will not persist: {}", e);
            SqliteStore::open_in_memory().map_err(|e| format!("Failed to open store: {}", e))?
        }
    };

    let mut front = Storefront::new(
        CatalogStore::load(backend),
        config.passcodes.clone(),
        config.banner,
    );
    front.open();

    let gemini = GeminiClient::new(config.gemini_settings());
    if !gemini.is_configured() {
        warn!("[init] No Gemini API key; the assistant will answer with an error");
    }
    let chat = ChatBridge::new(gemini);
    let mut voice = VoiceInput::new(WhisperTranscriber::capability(
        config.openai_transcription_api_key.clone(),
    ));
    let uploader = CloudinaryUploader::new(config.cloudinary.clone());

    info!(
        "[init] {} products, {} slides, theme {}",
        front.store().products().len(),
        front.store().hero_slides().len(),
        front.store().theme().as_str()
    );
    println!("Nexlyn catalog. Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let _ = stdout.write_all(format!("[{}] > ", front.view()).as_bytes()).await;
        let _ = stdout.flush().await;

        let line = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => return Err(format!("Failed to read input: {}", e)),
            },
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,

            // ============ Catalog ============
            "list" => print_products(&front.visible_products()),
            "featured" => print_products(&front.featured_products()),
            "category" => {
                front.select_category(if rest.is_empty() { "All" } else { rest });
                front.navigate(View::Products);
                print_products(&front.visible_products());
            }
            "search" => {
                front.set_search_query(rest);
                print_products(&front.visible_products());
            }
            "counts" => {
                for summary in front.category_summaries() {
                    println!("  {:<12} {:>3}", summary.name, summary.count);
                }
            }
            "show" => match front.open_product(rest).cloned() {
                Some(product) => {
                    print_product(&product);
                    let related = front.related();
                    if !related.is_empty() {
                        println!("  related:");
                        print_products(&related);
                    }
                }
                None => println!("No product with id {}", rest),
            },
            "view" => match View::parse(rest) {
                Some(view) => {
                    front.open_menu_item(view);
                    if view == View::About || view == View::Contact {
                        print_settings(front.store().settings());
                    }
                }
                None => println!("Unknown view: {}", rest),
            },
            "banner" => {
                if rest == "go" {
                    if front.click_banner() {
                        println!("Showing {}", front.selected_category());
                        print_products(&front.visible_products());
                    } else {
                        println!("This slide has no category");
                    }
                } else {
                    match front.active_slide() {
                        Some(slide) => println!(
                            "[{}] {} {}\n  {}",
                            slide.id,
                            slide.title,
                            if front.is_banner_exiting() { "(leaving)" } else { "" },
                            slide.subtitle
                        ),
                        None => println!("No slides"),
                    }
                }
            }
            "theme" => {
                report(front.toggle_theme());
                println!("Theme: {}", front.store().theme().as_str());
            }
            "quote" => {
                let link = if rest.is_empty() {
                    front.inquiry_link(InquiryContext::General)
                } else if rest == "reseller" {
                    front.inquiry_link(InquiryContext::Reseller)
                } else if let Some(product) = front.store().product(rest) {
                    front.inquiry_link(InquiryContext::Product(product))
                } else {
                    front.inquiry_link(InquiryContext::Category(rest))
                };
                println!("{}", link);
            }

            // ============ Assistant ============
            "ask" | "stream" => {
                let before = chat.messages().len();
                let turn = async {
                    if command == "stream" {
                        stream_turn(&chat, rest).await
                    } else {
                        (chat.ask(rest).await, false)
                    }
                };
                let (outcome, streamed) = tokio::select! {
                    result = turn => result,
                    _ = tokio::signal::ctrl_c() => {
                        chat.abandon();
                        println!("\n(stopped)");
                        (TurnOutcome::Abandoned, false)
                    }
                };
                if streamed {
                    print_stream_tail(&chat.messages(), before, &outcome);
                } else {
                    print_turn(&chat.messages(), before, &outcome);
                }
            }
            "voice" => match AudioClip::from_path(Path::new(rest)).await {
                Ok(clip) => {
                    let before = chat.messages().len();
                    match voice.capture(&chat.session(), clip).await {
                        VoiceOutcome::Transcribed(text) => {
                            println!("(heard) {}", text);
                            let before = chat.messages().len();
                            let outcome = chat.submit(true).await;
                            print_turn(&chat.messages(), before, &outcome);
                        }
                        VoiceOutcome::Failed(_) => {
                            let messages = chat.messages();
                            print_messages(messages.get(before..).unwrap_or(&[]));
                        }
                        VoiceOutcome::Ignored => println!("Already listening"),
                    }
                }
                Err(e) => println!("{}", e),
            },
            "chat" => print_messages(&chat.messages()),

            // ============ Admin ============
            "login" => match front.authorize(rest) {
                AccessRole::None => println!("Access denied"),
                role => println!("Signed in as {:?}", role),
            },
            "logout" => {
                front.sign_out();
                println!("Signed out");
            }
            "admin" => {
                let page = rest.parse().unwrap_or(1);
                match front.admin_page(page) {
                    Ok(page) => {
                        println!("Page {}/{}", page.page, page.page_count);
                        print_products(&page.items.iter().collect::<Vec<_>>());
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "overview" => match front.owner_overview() {
                Ok(o) => println!(
                    "{} products, {} slides, theme {}, access {:?}",
                    o.total_products,
                    o.total_slides,
                    o.theme.as_str(),
                    o.role
                ),
                Err(e) => println!("{}", e),
            },
            "add" => {
                let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
                let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
                let draft = ProductDraft {
                    name: field(0),
                    code: field(1),
                    category: Some(field(2)),
                    specs: field(3),
                    status: Some(field(4)),
                    ..ProductDraft::default()
                };
                match front.save_product(draft) {
                    Ok(status) => report(status),
                    Err(e) => println!("{}", e),
                }
            }
            "add-url" => {
                let (url, category) = rest.split_once('|').unwrap_or((rest, ""));
                let mut draft = ProductDraft {
                    category: Some(category.trim().to_string()),
                    ..ProductDraft::default()
                };
                if !draft.apply_product_url(url.trim()) {
                    println!("No /product/<code> in {}", url.trim());
                    continue;
                }
                match front.save_product(draft) {
                    Ok(status) => report(status),
                    Err(e) => println!("{}", e),
                }
            }
            "image" => {
                let (id, file) = rest.split_once(' ').unwrap_or((rest, ""));
                let Some(mut draft) = front.store().product(id).map(ProductDraft::from_product)
                else {
                    println!("No product with id {}", id);
                    continue;
                };
                if !front.role().can_edit() {
                    println!("unauthorized");
                    continue;
                }
                let blob = match ImageBlob::from_path(Path::new(file.trim())).await {
                    Ok(blob) => blob,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                match acquire_image(&uploader, &mut draft.image_url, blob).await {
                    Ok(()) => match front.save_product(draft) {
                        Ok(status) => report(status),
                        Err(e) => println!("{}", e),
                    },
                    Err(notice) => println!("{}", notice),
                }
            }
            "delete" => match front.delete_product(rest) {
                Ok(status) => report(status),
                Err(e) => println!("{}", e),
            },
            "slides" => {
                for slide in front.store().hero_slides() {
                    println!(
                        "  [{}] {} ({})",
                        slide.id,
                        slide.title,
                        slide.category_id.as_deref().unwrap_or("-")
                    );
                }
            }
            "slide-add" => {
                let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
                let field = |i: usize| fields.get(i).copied().unwrap_or("").to_string();
                let draft = SlideDraft {
                    target: None,
                    title: field(0),
                    subtitle: field(1),
                    image: field(2),
                    category_id: Some(field(3)),
                };
                match front.save_slide(draft) {
                    Ok(status) => report(status),
                    Err(e) => println!("{}", e),
                }
            }
            "slide-delete" => match front.delete_slide(&SlideId(rest.to_string())) {
                Ok(status) => report(status),
                Err(e) => println!("{}", e),
            },
            "set" => {
                let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
                let mut settings = front.store().settings().clone();
                let value = value.trim().to_string();
                match field {
                    "whatsapp" => settings.whatsapp_number = value,
                    "about" => settings.about = value,
                    "address" => settings.address = value,
                    "map" => settings.map_url = value,
                    _ => {
                        println!("Unknown setting: {}", field);
                        continue;
                    }
                }
                match front.update_settings(settings) {
                    Ok(status) => report(status),
                    Err(e) => println!("{}", e),
                }
            }
            "reset" => {
                if front.role() != AccessRole::Owner {
                    println!("unauthorized");
                    continue;
                }
                match clear_app_data() {
                    Ok(()) => {
                        println!("Local data deleted. Restart to reload the seed catalog.");
                        break;
                    }
                    Err(e) => println!("Failed to clear data: {}", e),
                }
            }
            other => println!("Unknown command: {} (try `help`)", other),
        }
    }

    Ok(())
}

fn report(status: SyncStatus) {
    match status {
        SyncStatus::Persisted => println!("Saved"),
        SyncStatus::Unchanged => println!("No change"),
        SyncStatus::Failed(message) => println!("Warning: {}", message),
    }
}

fn print_products(products: &[&Product]) {
    if products.is_empty() {
        println!("  (no products)");
    }
    for product in products {
        println!(
            "  {:<16} {:<32} {:<12} {}",
            product.id,
            product.name,
            product.category.as_str(),
            product.status.as_str()
        );
    }
}

fn print_product(product: &Product) {
    println!("{} ({})", product.name, product.code);
    println!("  {} | {}", product.category, product.status);
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
    for spec in &product.specs {
        println!("  • {}", spec);
    }
    if let Some(embed) = product.youtube_embed_url() {
        println!("  video: {}", embed);
    }
}

fn print_settings(settings: &SiteSettings) {
    println!("{}", settings.about);
    println!("  {}", settings.address);
    println!("  WhatsApp: +{}", settings.whatsapp_number);
    println!("  Map: {}", settings.map_url);
}

fn print_messages(messages: &[ChatMessage]) {
    for message in messages {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "nexy",
        };
        println!("{}: {}", speaker, message.content);
        for source in &message.sources {
            println!("    [{}] {}", source.title, source.uri);
        }
    }
}

/// Streams a turn, echoing text as it arrives. The flag says whether anything was printed.
async fn stream_turn<T: ChatTransport>(chat: &ChatBridge<T>, prompt: &str) -> (TurnOutcome, bool) {
    let mut printed = false;
    let outcome = chat
        .ask_stream_with(prompt, |text| {
            if !printed {
                print!("nexy: ");
                printed = true;
            }
            print!("{}", text);
            let _ = std::io::stdout().flush();
        })
        .await;
    if printed {
        println!();
    }
    (outcome, printed)
}

/// What a streamed turn left behind besides the already printed text.
fn print_stream_tail(messages: &[ChatMessage], before: usize, outcome: &TurnOutcome) {
    // The reply sits right after the echoed user message.
    if let Some(reply) = messages.get(before + 1) {
        for source in &reply.sources {
            println!("    [{}] {}", source.title, source.uri);
        }
    }
    if matches!(outcome, TurnOutcome::Failed(_)) {
        print_messages(messages.get(before + 2..).unwrap_or(&[]));
    }
}

fn print_turn(messages: &[ChatMessage], before: usize, outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Rejected(e) => println!("{}", e),
        _ => {
            // Skip the echoed user message.
            let start = (before + 1).min(messages.len());
            print_messages(&messages[start..]);
        }
    }
}
