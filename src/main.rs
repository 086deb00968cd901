mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utils::{config::Config, db::establish_connection};

use crate::middleware::auth::JwtMiddleware;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file FIRST before anything else
    dotenv::dotenv().ok();

    // Initialize logger with default level if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("🏫 School Administration Backend");
    println!("=================================================");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    let host = config.host.clone();
    let port = config.port;

    println!("📝 Configuration loaded:");
    println!(
        "   - Database: {}",
        config.database_url.split('@').last().unwrap_or("***")
    );
    println!("   - Host: {}", host);
    println!("   - Port: {}", port);
    println!(
        "   - Log level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    );

    // Establish database connection
    print!("🔌 Connecting to database... ");
    let db = establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    println!("✅ Connected!");

    log::info!("Database connection established");

    println!("🌐 Starting HTTP server at http://{}:{}", host, port);
    log::info!("Server started at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin(&config.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .wrap(cors) // CORS must be wrapped AFTER Logger to ensure headers are added to all responses
            // Public endpoints (no authentication required)
            .service(
                web::scope("/public")
                    .route(
                        "/report-card-data",
                        web::get().to(handlers::public::report_card_data),
                    )
                    .route(
                        "/admit-card-data",
                        web::get().to(handlers::public::admit_card_data),
                    )
                    .route("/id-card-data", web::get().to(handlers::public::id_card_data))
                    .route(
                        "/date-sheet-data",
                        web::get().to(handlers::public::date_sheet_data),
                    )
                    .route(
                        "/settings-data",
                        web::get().to(handlers::public::settings_data),
                    )
                    .route(
                        "/academic-sessions",
                        web::get().to(handlers::public::list_sessions),
                    )
                    .route(
                        "/academic-terms",
                        web::get().to(handlers::public::list_terms),
                    )
                    .route(
                        "/academic-classes",
                        web::get().to(handlers::public::list_classes),
                    ),
            )
            // Everything below requires a bearer token
            .service(
                web::scope("/academic-sessions")
                    .wrap(JwtMiddleware)
                    .route(
                        "",
                        web::post().to(handlers::academic_sessions::create_session),
                    )
                    .route("", web::get().to(handlers::academic_sessions::list_sessions))
                    .route(
                        "/{id}",
                        web::get().to(handlers::academic_sessions::get_session),
                    )
                    .route(
                        "/{id}",
                        web::patch().to(handlers::academic_sessions::update_session),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::academic_sessions::delete_session),
                    )
                    .route(
                        "/{id}/create-academic-terms",
                        web::post().to(handlers::academic_sessions::create_terms_for_session),
                    )
                    .route(
                        "/{id}/create-academic-classes",
                        web::post().to(handlers::academic_sessions::create_classes_for_session),
                    ),
            )
            .service(
                web::scope("/academic-terms")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::academic_terms::create_term))
                    .route("", web::get().to(handlers::academic_terms::list_terms))
                    .route("/{id}", web::get().to(handlers::academic_terms::get_term))
                    .route("/{id}", web::patch().to(handlers::academic_terms::update_term))
                    .route(
                        "/{id}",
                        web::delete().to(handlers::academic_terms::delete_term),
                    ),
            )
            .service(
                web::scope("/academic-classes")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::academic_classes::create_class))
                    .route("", web::get().to(handlers::academic_classes::list_classes))
                    .route("/{id}", web::get().to(handlers::academic_classes::get_class))
                    .route(
                        "/{id}",
                        web::patch().to(handlers::academic_classes::update_class),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::academic_classes::delete_class),
                    ),
            )
            .service(
                web::scope("/subjects")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::subjects::create_subject))
                    .route("", web::get().to(handlers::subjects::list_subjects))
                    .route("/{id}", web::get().to(handlers::subjects::get_subject))
                    .route("/{id}", web::patch().to(handlers::subjects::update_subject))
                    .route("/{id}", web::delete().to(handlers::subjects::delete_subject)),
            )
            .service(
                web::scope("/class-subjects")
                    .wrap(JwtMiddleware)
                    .route(
                        "",
                        web::post().to(handlers::class_subjects::create_class_subject),
                    )
                    .route("", web::get().to(handlers::class_subjects::list_class_subjects))
                    .route("/reorder", web::put().to(handlers::class_subjects::reorder))
                    .route(
                        "/{id}",
                        web::get().to(handlers::class_subjects::get_class_subject),
                    )
                    .route(
                        "/{id}",
                        web::patch().to(handlers::class_subjects::update_class_subject),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::class_subjects::delete_class_subject),
                    ),
            )
            .service(
                web::scope("/students")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::students::create_student))
                    .route("", web::get().to(handlers::students::list_students))
                    .route("/{id}", web::get().to(handlers::students::get_student))
                    .route("/{id}", web::patch().to(handlers::students::update_student))
                    .route("/{id}", web::delete().to(handlers::students::delete_student)),
            )
            .service(
                web::scope("/enrollments")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::enrollments::create_enrollment))
                    .route("", web::get().to(handlers::enrollments::list_enrollments))
                    .route("/count", web::get().to(handlers::enrollments::count_enrollments))
                    .route("/{id}", web::get().to(handlers::enrollments::get_enrollment))
                    .route(
                        "/{id}",
                        web::patch().to(handlers::enrollments::update_enrollment),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::enrollments::delete_enrollment),
                    ),
            )
            .service(
                web::scope("/report-cards")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::report_cards::create_report_card))
                    .route("", web::get().to(handlers::report_cards::list_report_cards))
                    .route(
                        "/generate",
                        web::post().to(handlers::report_cards::generate_report_cards),
                    )
                    .route("/{id}", web::get().to(handlers::report_cards::get_report_card))
                    .route(
                        "/{id}",
                        web::patch().to(handlers::report_cards::update_report_card),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(handlers::report_cards::delete_report_card),
                    ),
            )
            .service(
                web::scope("/report-card-subjects")
                    .wrap(JwtMiddleware)
                    .route(
                        "",
                        web::get().to(handlers::report_card_subjects::list_report_card_subjects),
                    )
                    .route(
                        "/{id}",
                        web::patch().to(handlers::report_card_subjects::update_report_card_subject),
                    ),
            )
            .service(
                web::scope("/date-sheets")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::date_sheets::create_date_sheet))
                    .route("", web::get().to(handlers::date_sheets::list_date_sheets))
                    .route("/find", web::get().to(handlers::date_sheets::find_date_sheet))
                    .route("/{id}", web::get().to(handlers::date_sheets::get_date_sheet))
                    .route(
                        "/{id}",
                        web::delete().to(handlers::date_sheets::delete_date_sheet),
                    ),
            )
            .service(
                web::scope("/date-sheet-subjects")
                    .wrap(JwtMiddleware)
                    .route(
                        "",
                        web::get().to(handlers::date_sheet_subjects::list_date_sheet_subjects),
                    )
                    .route(
                        "/{id}",
                        web::patch().to(handlers::date_sheet_subjects::update_date_sheet_subject),
                    ),
            )
            .service(
                web::scope("/users")
                    .wrap(JwtMiddleware)
                    .route("", web::post().to(handlers::users::create_user))
                    .route("", web::get().to(handlers::users::list_users))
                    .route("/me", web::get().to(handlers::users::get_me))
                    .route("/{id}", web::get().to(handlers::users::get_user))
                    .route("/{id}", web::patch().to(handlers::users::update_user))
                    .route("/{id}", web::delete().to(handlers::users::delete_user)),
            )
            .service(
                web::scope("/app-settings")
                    .wrap(JwtMiddleware)
                    .route("", web::get().to(handlers::app_settings::get_settings))
                    .route("", web::patch().to(handlers::app_settings::update_settings)),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
