use http::header::{HeaderValue, LOCATION};
use http::{Method, StatusCode};
use micro_dispatch::di::{Container, Injectable, Resolver};
use micro_dispatch::extract::{Json, Path};
use micro_dispatch::middleware::{post_fn, pre_fn};
use micro_dispatch::serializer::Serialized;
use micro_dispatch::{
    Application, Controller, DependencyError, Headers, HttpException, Payload, Reply, Request, Response, delete, get,
    handler_fn, post,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(thiserror::Error, Debug)]
#[error("Error")]
struct ValueError;

#[derive(thiserror::Error, Debug)]
#[error("custom")]
struct CustomException;

#[derive(thiserror::Error, Debug)]
#[error("lookup failed")]
struct LookupFailed {
    #[source]
    cause: HttpException,
}

fn request(method: &str, path: &str) -> Request {
    Request::builder().method(method).path(path).build().unwrap()
}

async fn hello() -> &'static str {
    "Hello, world!"
}

#[tokio::test]
async fn test_request_lifecycle() {
    let app = Application::builder().endpoint(get("/", handler_fn(hello))).build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"Hello, world!");
    assert_eq!(res.headers().get("Content-Type"), Some("text/html"));
    assert!(res.headers().is_frozen());
}

#[tokio::test]
async fn test_request_not_found() {
    let app = Application::builder().endpoint(get("/", handler_fn(hello))).build();

    for res in [app.run(request("GET", "/missing")).await, app.run(request("POST", "/")).await] {
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.text(), "404 - Resource not found");
        assert_eq!(res.content_type(), Some("text/plain"));
    }
}

#[tokio::test]
async fn test_unmapped_error_falls_back_to_500() {
    async fn failing() -> Result<String, ValueError> {
        Err(ValueError)
    }

    let app = Application::builder().endpoint(get("/", handler_fn(failing))).build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text(), "500 - Internal Server Error: ValueError(Error)");
    assert_eq!(res.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_custom_exception_handler() {
    async fn failing() -> Result<(), CustomException> {
        Err(CustomException)
    }

    let app = Application::builder()
        .endpoint(get("/", handler_fn(failing)))
        .exception_handler(|_e: &CustomException| Response::new(StatusCode::IM_A_TEAPOT, "I'm a teapot"))
        .build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(res.text(), "I'm a teapot");
    assert_eq!(res.content_type(), Some("text/html"));
}

#[tokio::test]
async fn test_exception_handler_value_defaults_to_500() {
    async fn failing() -> Result<(), CustomException> {
        Err(CustomException)
    }

    let app = Application::builder()
        .endpoint(get("/", handler_fn(failing)))
        .exception_handler(|e: &CustomException| format!("handled {e}"))
        .build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text(), "handled custom");
}

#[tokio::test]
async fn test_source_chain_is_searched() {
    async fn failing() -> Result<(), LookupFailed> {
        Err(LookupFailed { cause: HttpException::not_found().with_detail("Client not found") })
    }

    let app = Application::builder().endpoint(get("/", handler_fn(failing))).build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text(), "404 - Client not found");
}

#[tokio::test]
async fn test_serialization() {
    async fn handler() -> serde_json::Value {
        serde_json::json!({"name": "John Doe"})
    }

    let app = Application::builder().endpoint(get("/", handler_fn(handler))).build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text(), r#"{"name": "John Doe"}"#);
    assert_eq!(res.content_type(), Some("application/json"));
}

#[tokio::test]
async fn test_custom_serialization() {
    struct DummyClass {
        name: String,
    }

    async fn handler() -> Payload {
        Payload::object(DummyClass { name: "John Doe".into() })
    }

    let app = Application::builder()
        .endpoint(get("/", handler_fn(handler)))
        .add_serializer::<DummyClass, _>(|data| Serialized::typed(format!("<name>{}</name>", data.name), "application/xml"))
        .build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text(), "<name>John Doe</name>");
    assert_eq!(res.content_type(), Some("application/xml"));
}

#[tokio::test]
async fn test_unserializable_value() {
    struct Unknown;

    async fn handler() -> Payload {
        Payload::object(Unknown)
    }

    let app = Application::builder().endpoint(get("/", handler_fn(handler))).build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().starts_with("500 - Internal Server Error: SerializationError("));
    assert!(res.text().contains("Unknown"));
}

#[tokio::test]
async fn test_tuple_replies_and_endpoint_defaults() {
    async fn create() -> (&'static str, StatusCode, Headers) {
        ("Client created", StatusCode::CREATED, Headers::from_pairs([("x-api-key", "123")]).unwrap())
    }

    async fn remove() -> &'static str {
        "Client deleted"
    }

    let app = Application::builder()
        .endpoint(post("/clients", handler_fn(create)).with_header(LOCATION, HeaderValue::from_static("/clients/1")))
        .endpoint(delete("/clients/{id}", handler_fn(remove)).with_status(StatusCode::ACCEPTED))
        .build();

    let res = app.run(request("POST", "/clients")).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers().get("X-Api-Key"), Some("123"));
    assert_eq!(res.headers().get("location"), Some("/clients/1"));
    assert_eq!(res.content_type(), Some("text/html"));

    let res = app.run(request("delete", "/clients/1")).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.text(), "Client deleted");
}

#[tokio::test]
async fn test_binding_error_is_400() {
    async fn show(Path(ClientId { id }): Path<ClientId>) -> String {
        format!("client {id}")
    }

    let app = Application::builder().endpoint(get("/clients/{id}", handler_fn(show))).build();

    let res = app.run(request("GET", "/clients/7")).await;
    assert_eq!(res.text(), "client 7");

    let res = app.run(request("GET", "/clients/abc")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().starts_with("400 - invalid path params"));
    assert_eq!(res.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_middleware_order() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    let pre = |name: &'static str| {
        let log = Arc::clone(&log);
        pre_fn(move |_req: &Request| {
            log.lock().unwrap().push(name.to_owned());
            Ok(None)
        })
    };
    let post = |name: &'static str| {
        let log = Arc::clone(&log);
        post_fn(move |_reply: &Reply| {
            log.lock().unwrap().push(name.to_owned());
            Ok(None)
        })
    };

    let handler_log = Arc::clone(&log);
    let controller = Controller::new("c")
        .with_pre(pre("P1"))
        .with_pre(pre("P2"))
        .with_post(post("controller-post"))
        .endpoint(
            get(
                "/",
                handler_fn(move || {
                    let log = Arc::clone(&handler_log);
                    async move {
                        log.lock().unwrap().push("callback".to_owned());
                        "done"
                    }
                }),
            )
            .with_pre(pre("P3"))
            .with_post(post("handler-post")),
        );

    let app = Application::builder()
        .pre_middleware(pre("P0"))
        .post_middleware(post("app-post"))
        .controller(controller)
        .build();

    let res = app.run(request("GET", "/c")).await;
    assert_eq!(res.text(), "done");
    assert_eq!(
        *log.lock().unwrap(),
        vec!["P0", "P1", "P2", "P3", "callback", "handler-post", "controller-post", "app-post"]
    );
}

#[tokio::test]
async fn test_replaced_request_keeps_path_params() {
    async fn show(Path(ClientId { id }): Path<ClientId>, headers: Headers) -> String {
        format!("client {id} for {}", headers.get("x-user").unwrap_or("nobody"))
    }

    let app = Application::builder()
        .endpoint(get("/clients/{id}", handler_fn(show)).with_pre(pre_fn(|req: &Request| {
            let replaced =
                Request::builder().method(req.method().as_str()).path(req.path()).header("x-user", "ana").build()?;
            Ok(Some(replaced))
        })))
        .pre_middleware(pre_fn(|req: &Request| Ok(Some(req.to_builder().header("x-trace", "1").build()?))))
        .build();

    let res = app.run(request("GET", "/clients/7")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text(), "client 7 for ana");
}

#[tokio::test]
async fn test_unit_handler_renders_empty_body() {
    async fn noop() {}

    let app = Application::builder().endpoint(delete("/clients/{id}", handler_fn(noop))).build();

    let res = app.run(request("DELETE", "/clients/3")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.body().is_empty());
    assert_eq!(res.content_type(), Some("text/html"));
}

#[tokio::test]
async fn test_pre_middleware_aborts() {
    let called = Arc::new(Mutex::new(false));
    let handler_called = Arc::clone(&called);

    let app = Application::builder()
        .endpoint(
            get(
                "/secret",
                handler_fn(move || {
                    let called = Arc::clone(&handler_called);
                    async move {
                        *called.lock().unwrap() = true;
                        "secret"
                    }
                }),
            )
            .with_pre(pre_fn(|req: &Request| match req.headers().get("authorization") {
                Some(_) => Ok(None),
                None => Err(HttpException::unauthorized().into()),
            })),
        )
        .build();

    let res = app.run(request("GET", "/secret")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.text(), "401 - Unauthorized");
    assert!(!*called.lock().unwrap());
}

#[tokio::test]
async fn test_post_middleware_transforms_reply() {
    let app = Application::builder()
        .endpoint(get("/", handler_fn(hello)))
        .post_middleware(post_fn(|reply: &Reply| match reply.payload() {
            Some(Payload::Text(text)) => Ok(Some(Reply::value(Payload::text(text.to_uppercase())))),
            _ => Ok(None),
        }))
        .build();

    let res = app.run(request("GET", "/")).await;
    assert_eq!(res.text(), "HELLO, WORLD!");
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct ClientModel {
    #[serde(default)]
    id: u32,
    name: String,
    age: u32,
}

#[derive(Default)]
struct ClientService {
    clients: Mutex<Vec<ClientModel>>,
}

impl Injectable for ClientService {
    fn inject(_resolver: &mut Resolver<'_>) -> Result<Self, DependencyError> {
        Ok(ClientService::default())
    }
}

impl ClientService {
    fn save(&self, mut client: ClientModel) -> u32 {
        let mut clients = self.clients.lock().unwrap();
        client.id = u32::try_from(clients.len()).unwrap() + 1;
        let id = client.id;
        clients.push(client);
        id
    }

    fn get(&self, id: u32) -> Option<ClientModel> {
        self.clients.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }
}

#[derive(Deserialize)]
struct ClientId {
    id: u32,
}

fn client_controller(service: &Arc<ClientService>) -> Controller {
    let creating = Arc::clone(service);
    let reading = Arc::clone(service);

    Controller::new("clients")
        .endpoint(
            post(
                "",
                handler_fn(move |Json(client): Json<ClientModel>| {
                    let service = Arc::clone(&creating);
                    async move { (format!("Client {} created", service.save(client)), StatusCode::CREATED) }
                }),
            )
            .with_status(StatusCode::CREATED),
        )
        .endpoint(get(
            "/{id}",
            handler_fn(move |Path(ClientId { id }): Path<ClientId>| {
                let service = Arc::clone(&reading);
                async move {
                    service
                        .get(id)
                        .map(Json)
                        .ok_or_else(|| HttpException::not_found().with_detail("Client not found"))
                }
            }),
        ))
}

#[tokio::test]
async fn test_controller_with_injected_service() {
    let mut container = Container::new();
    container.register::<ClientService>(true);
    let service = container.resolve::<ClientService>().unwrap();

    let app = Arc::new(Application::builder().controller(client_controller(&service)).container(container).build());

    let create = Request::builder()
        .method(Method::POST.as_str())
        .path("/clients")
        .header("Content-Type", "application/json")
        .body(r#"{"name": "John Doe", "age": 22}"#)
        .build()
        .unwrap();
    let res = app.run(create).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text(), "Client 1 created");

    let handles = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::spawn(async move { app.run(request("GET", "/clients/1")).await })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        let res = handle.await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.text(), r#"{"id": 1, "name": "John Doe", "age": 22}"#);
    }

    let res = app.run(request("GET", "/clients/2")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text(), "404 - Client not found");

    let same = app.container().resolve::<ClientService>().unwrap();
    assert!(Arc::ptr_eq(&service, &same));
}
