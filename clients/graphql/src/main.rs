use actix_cors::Cors;
use actix_web::{
    get,
    middleware::{self, Condition},
    route,
    web::{self, Data, ServiceConfig},
    App, HttpResponse, HttpServer, Responder,
};
use actix_web_lab::respond::Html;
use clap::{Parser, ValueEnum};
use database::{
    database::{database::Database, options::DatabaseOptions, request_manager::RequestManager},
    persistence::storage::StorageEngine,
};
use juniper::http::{graphiql::graphiql_source, GraphQLRequest};
use std::{io, path::PathBuf, sync::Arc};

use crate::schema::{create_schema, GraphQLContext, Schema};

mod schema;

/// GraphiQL playground UI
#[get("/graphiql")]
async fn graphql_playground() -> impl Responder {
    Html(graphiql_source("/graphql", None))
}

/// GraphQL endpoint -- triggered once per request
#[route("/graphql", method = "GET", method = "POST")]
async fn graphql(
    schema: web::Data<Schema>,
    context: web::Data<GraphQLContext>,
    data: web::Json<GraphQLRequest>,
) -> impl Responder {
    let response = data.execute(&schema, context.get_ref()).await;

    HttpResponse::Ok().json(response)
}

fn configure_routes(graphiql: bool) -> impl Fn(&mut ServiceConfig) {
    move |config| {
        config.service(graphql);

        if graphiql {
            config.service(graphql_playground);
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StorageKind {
    /// Transaction log and snapshots are written to the data directory
    File,
    /// Nothing is persisted, the data is lost on shutdown
    Memory,
}

/// 📀 Project tracker GraphQL server, stores clients and their projects
#[derive(Parser, Debug)]
struct Cli {
    /// Location of the database. Reads / writes to this directory. Note: Does not support shell paths, e.g. ~
    #[clap(short, long, env = "DATA_DIR", default_value = "data")]
    data: PathBuf,

    /// Where the transaction log and snapshots are kept
    #[clap(long, env = "STORAGE", value_enum, default_value_t = StorageKind::File)]
    storage: StorageKind,

    /// Port the graphql server will run on
    #[clap(short, long, env = "PORT", default_value = "6000")]
    port: u16,

    /// Address the graphql server will run on
    #[clap(short, long, env = "ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// Logs every HTTP request
    #[clap(long)]
    log_http: bool,

    #[clap(long, env = "HTTP_WORKERS", default_value_t = 2)]
    http_workers: usize,

    #[clap(long, env = "DATABASE_THREADS", default_value_t = 2)]
    database_threads: usize,

    /// Snapshots the database once this many transactions are in the log, 0 disables it
    #[clap(long, env = "SNAPSHOT_THRESHOLD", default_value_t = 1_000)]
    snapshot_threshold: usize,

    /// Serves the GraphiQL playground on /graphiql
    #[clap(long, env = "GRAPHIQL")]
    graphiql: bool,

    /// Prints the schema in GraphQL schema language and exits
    #[clap(long)]
    print_schema: bool,
}

impl Cli {
    fn database_options(&self) -> DatabaseOptions {
        let storage_engine = match self.storage {
            StorageKind::File => StorageEngine::File(self.data.clone()),
            StorageKind::Memory => StorageEngine::Memory,
        };

        DatabaseOptions::default()
            .set_storage_engine(storage_engine)
            .set_threads(self.database_threads)
            .set_snapshot_threshold(Some(self.snapshot_threshold))
    }
}

/// Snapshots first so the next start reads one blob instead of replaying the log, then stops
/// every worker. A failed snapshot leaves the log in place for replay.
fn shutdown_database(request_manager: &RequestManager) {
    match request_manager.send_snapshot_request() {
        Ok(message) => log::info!("Snapshot before shutdown: {}", message),
        Err(e) => log::error!("Unable to snapshot before shutdown: {}", e),
    }

    match request_manager.send_shutdown_request() {
        Ok(message) => log::info!("Shutting down database: {}", message),
        Err(e) => log::error!("Failed to shut down database cleanly: {}", e),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Cli::parse();

    // Create Juniper schema
    let schema = Arc::new(create_schema());

    if args.print_schema {
        println!("{}", schema.as_schema_language());
        return Ok(());
    }

    let database_options = args.database_options();

    log::info!(
        "Starting database, storage: {}",
        database_options.storage_engine.describe()
    );

    let request_manager = Database::new(database_options)
        .and_then(|database| database.run())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let context = Data::new(GraphQLContext::new(request_manager.clone()));

    log::info!("starting HTTP server on port {}.", args.port);

    if args.graphiql {
        log::info!(
            "GraphiQL playground: http://{}:{}/graphiql",
            args.address,
            args.port
        );
    }

    let log_http = args.log_http;
    let graphiql = args.graphiql;

    // Start HTTP server, actix handles SIGINT / SIGTERM and returns once workers have stopped
    let server_result = HttpServer::new(move || {
        App::new()
            .app_data(Data::from(schema.clone()))
            .app_data(context.clone())
            .configure(configure_routes(graphiql))
            .wrap(Cors::permissive())
            .wrap(Condition::new(log_http, middleware::Logger::default()))
    })
    .workers(args.http_workers)
    .bind((args.address, args.port))?
    .run()
    .await;

    shutdown_database(&request_manager);

    server_result
}

#[cfg(test)]
mod tests {
    use actix_web::test::{call_and_read_body_json, call_service, init_service, TestRequest};
    use database::repository::client::{ClientRepository, DatabaseClientRepository};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use super::*;

    #[actix_web::test]
    async fn graphql_endpoint_round_trip() {
        let request_manager = Database::new_test().run().unwrap();

        let app = init_service(
            App::new()
                .app_data(Data::new(create_schema()))
                .app_data(Data::new(GraphQLContext::new(request_manager)))
                .configure(configure_routes(false)),
        )
        .await;

        let request = TestRequest::post()
            .uri("/graphql")
            .set_json(json!({
                "query": "mutation AddClient($name: String!) { addClient(name: $name) { name email } }",
                "variables": { "name": "Acme" }
            }))
            .to_request();

        let response: Value = call_and_read_body_json(&app, request).await;

        assert_eq!(
            response,
            json!({ "data": { "addClient": { "name": "Acme", "email": null } } })
        );

        let request = TestRequest::post()
            .uri("/graphql")
            .set_json(json!({ "query": "{ clients { name } }" }))
            .to_request();

        let response: Value = call_and_read_body_json(&app, request).await;

        assert_eq!(response, json!({ "data": { "clients": [{ "name": "Acme" }] } }));
    }

    #[actix_web::test]
    async fn graphiql_only_mounted_when_enabled() {
        let request_manager = Database::new_test().run().unwrap();

        let app = init_service(
            App::new()
                .app_data(Data::new(create_schema()))
                .app_data(Data::new(GraphQLContext::new(request_manager)))
                .configure(configure_routes(false)),
        )
        .await;

        let request = TestRequest::get().uri("/graphiql").to_request();
        let response = call_service(&app, request).await;

        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);

        let app = init_service(App::new().configure(configure_routes(true))).await;

        let request = TestRequest::get().uri("/graphiql").to_request();
        let response = call_service(&app, request).await;

        assert!(response.status().is_success());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["project-tracker", "--storage", "memory"]);

        assert_eq!(cli.data, PathBuf::from("data"));
        assert!(!cli.graphiql);

        let options = cli.database_options();

        assert_eq!(options.storage_engine, StorageEngine::Memory);
        assert_eq!(options.threads, 2);
        assert_eq!(options.snapshot_threshold, Some(1_000));

        let cli = Cli::parse_from(["project-tracker", "--snapshot-threshold", "0"]);

        assert_eq!(cli.database_options().snapshot_threshold, None);
    }

    #[test]
    fn shutdown_snapshots_and_next_start_restores() {
        let database_dir: PathBuf = ["/", "tmp", "project-tracker", &Uuid::new_v4().to_string()]
            .iter()
            .collect();

        let cli = Cli::parse_from([
            "project-tracker",
            "--data",
            database_dir.to_str().unwrap(),
            "--database-threads",
            "1",
        ]);

        let request_manager = Database::new(cli.database_options())
            .unwrap()
            .run()
            .unwrap();

        let client = DatabaseClientRepository::new(request_manager.clone())
            .create_client("Acme".to_string(), None, None)
            .unwrap();

        shutdown_database(&request_manager);

        let log = std::fs::read_to_string(database_dir.join("transaction_log.json")).unwrap();

        assert!(log.is_empty(), "Snapshot should have flushed the log");

        let request_manager = Database::new(cli.database_options())
            .unwrap()
            .run()
            .unwrap();

        let clients = DatabaseClientRepository::new(request_manager.clone())
            .find_clients()
            .unwrap();

        assert_eq!(clients, vec![client]);

        request_manager.send_shutdown_request().unwrap();
    }
}
