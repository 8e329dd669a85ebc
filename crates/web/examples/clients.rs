//! A small client registry: a controller backed by a service resolved from the DI container.
//!
//! There is no socket here, requests are built in memory and handed to `Application::run`.

use http::StatusCode;
use micro_dispatch::di::{Container, Injectable, Resolver};
use micro_dispatch::extract::{Json, Path, Query};
use micro_dispatch::middleware::pre_fn;
use micro_dispatch::{
    Application, Controller, DependencyError, HttpException, Request, Response, delete, get, handler_fn, post,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Client {
    #[serde(default)]
    id: u32,
    name: String,
    age: u32,
}

trait ClientRepository: Send + Sync {
    fn save(&self, client: Client) -> u32;
    fn find(&self, id: u32) -> Option<Client>;
    fn all(&self) -> Vec<Client>;
    fn remove(&self, id: u32) -> Option<Client>;
}

#[derive(Default)]
struct InMemoryRepository {
    clients: Mutex<BTreeMap<u32, Client>>,
}

impl Injectable for InMemoryRepository {
    fn inject(_resolver: &mut Resolver<'_>) -> Result<Self, DependencyError> {
        Ok(InMemoryRepository::default())
    }
}

impl ClientRepository for InMemoryRepository {
    fn save(&self, mut client: Client) -> u32 {
        let mut clients = self.clients.lock().unwrap();
        client.id = clients.keys().next_back().map_or(1, |last| last + 1);
        let id = client.id;
        clients.insert(id, client);
        id
    }

    fn find(&self, id: u32) -> Option<Client> {
        self.clients.lock().unwrap().get(&id).cloned()
    }

    fn all(&self) -> Vec<Client> {
        self.clients.lock().unwrap().values().cloned().collect()
    }

    fn remove(&self, id: u32) -> Option<Client> {
        self.clients.lock().unwrap().remove(&id)
    }
}

struct ClientService {
    repository: Arc<dyn ClientRepository>,
}

impl Injectable for ClientService {
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, DependencyError> {
        Ok(ClientService { repository: resolver.resolve()? })
    }
}

#[derive(Deserialize)]
struct ClientId {
    id: u32,
}

#[derive(Deserialize)]
struct Filter {
    #[serde(default)]
    min_age: u32,
}

fn client_controller(service: &Arc<ClientService>) -> Controller {
    let (creating, listing, showing, removing) =
        (Arc::clone(service), Arc::clone(service), Arc::clone(service), Arc::clone(service));

    Controller::new("clients")
        .with_pre(pre_fn(|req: &Request| {
            info!(method = %req.method(), path = req.path(), "clients request");
            Ok(None)
        }))
        .endpoint(post(
            "",
            handler_fn(move |Json(client): Json<Client>| {
                let service = Arc::clone(&creating);
                async move { (format!("Client {} created", service.repository.save(client)), StatusCode::CREATED) }
            }),
        ))
        .endpoint(get(
            "",
            handler_fn(move |Query(filter): Query<Filter>| {
                let service = Arc::clone(&listing);
                async move {
                    let clients = service.repository.all();
                    Json(clients.into_iter().filter(|c| c.age >= filter.min_age).collect::<Vec<_>>())
                }
            }),
        ))
        .endpoint(get(
            "/{id}",
            handler_fn(move |Path(ClientId { id }): Path<ClientId>| {
                let service = Arc::clone(&showing);
                async move {
                    service.repository.find(id).map(Json).ok_or_else(|| HttpException::not_found().with_detail("Client not found"))
                }
            }),
        ))
        .endpoint(
            delete(
                "/{id}",
                handler_fn(move |Path(ClientId { id }): Path<ClientId>| {
                    let service = Arc::clone(&removing);
                    async move {
                        match service.repository.remove(id) {
                            Some(_) => Ok("Client deleted"),
                            None => Err(HttpException::not_found().with_detail("Client not found")),
                        }
                    }
                }),
            )
            .with_status(StatusCode::ACCEPTED),
        )
}

fn print(label: &str, response: &Response) {
    info!(
        label,
        status = response.status().as_u16(),
        content_type = response.content_type().unwrap_or_default(),
        body = %response.text(),
        "response"
    );
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut container = Container::new();
    container
        .register_swappable::<dyn ClientRepository, InMemoryRepository, _>(true, |c| c as Arc<dyn ClientRepository>)
        .register::<ClientService>(true);
    let service = container.resolve::<ClientService>().expect("client service should resolve");

    let app = Application::builder()
        .controller(client_controller(&service))
        .container(container)
        .exception_handler(|e: &DependencyError| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        .build();

    for (name, age) in [("John Doe", 22), ("Ana", 41)] {
        let req = Request::builder()
            .method("POST")
            .path("/clients")
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"name": name, "age": age}).to_string())
            .build()
            .expect("valid request");
        print("create", &app.run(req).await);
    }

    let requests = [
        ("list", Request::builder().path("/clients").query("min_age", "30")),
        ("show", Request::builder().path("/clients/1")),
        ("delete", Request::builder().method("delete").path("/clients/1")),
        ("show deleted", Request::builder().path("/clients/1")),
        ("bad id", Request::builder().path("/clients/one")),
        ("unknown", Request::builder().path("/orders")),
    ];
    for (label, builder) in requests {
        print(label, &app.run(builder.build().expect("valid request")).await);
    }
}
