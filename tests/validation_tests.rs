use async_trait::async_trait;
use recipe_gate::{
    AppError, AppResult, ContentInteractor, ContentService,
    interactor::ContentEntity,
    models::Salad,
    validation::{
        KeywordValidator, Outcome, TIMEOUT_REASON, UrlPolicy, UrlValidator, Validator,
        url::HostResolver,
    },
};
use std::{
    io,
    net::IpAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use uuid::Uuid;

// --- Test Doubles ---

// Wrapped service that only counts how often the interactor delegates to it.
#[derive(Default)]
struct CountingService {
    creates: AtomicUsize,
    updates: AtomicUsize,
    reads: AtomicUsize,
}

#[async_trait]
impl ContentService<Salad> for CountingService {
    async fn create(&self, _entity: Salad) -> AppResult<Uuid> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Uuid::new_v4())
    }

    async fn update(&self, _entity: Salad) -> AppResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Salad> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Salad {
            id,
            name: "buy spam now".to_string(),
            ..Salad::default()
        })
    }
}

// Records calls; answers with a fixed outcome.
struct ScriptedValidator {
    outcome: Outcome,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn check(&self, _text: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

struct SlowResolver;

#[async_trait]
impl HostResolver for SlowResolver {
    async fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(vec!["93.184.216.34".parse().unwrap()])
    }
}

// Fails transiently `failures` times, then resolves to `answer`.
struct FlakyResolver {
    failures: usize,
    answer: Vec<IpAddr>,
    calls: AtomicUsize,
}

#[async_trait]
impl HostResolver for FlakyResolver {
    async fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(io::Error::new(io::ErrorKind::TimedOut, "dns timeout"))
        } else {
            Ok(self.answer.clone())
        }
    }
}

fn salad(name: &str, description: &str) -> Salad {
    Salad {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn spam_and_evil_pipeline() -> (ContentInteractor<Salad>, Arc<CountingService>) {
    let service = Arc::new(CountingService::default());
    let keyword: Arc<dyn Validator> = Arc::new(KeywordValidator::new(["spam"]));
    let url: Arc<dyn Validator> = Arc::new(UrlValidator::new(UrlPolicy {
        blocked_hosts: vec!["evil.test".to_string()],
        ..UrlPolicy::default()
    }));
    let interactor = ContentInteractor::<Salad>::new(service.clone(), vec![keyword, url]);
    (interactor, service)
}

// --- Keyword Validator ---

#[tokio::test]
async fn keyword_matches_whole_words_ignoring_case() {
    let validator = KeywordValidator::new(["spam"]);

    assert!(!validator.check("Buy SPAM now").await.is_valid());
    assert!(!validator.check("spam!").await.is_valid());
    assert!(validator.check("the spammer left").await.is_valid());
    assert!(validator.check("").await.is_valid());
}

#[tokio::test]
async fn keyword_reason_names_the_keyword() {
    let validator = KeywordValidator::new(["scam", "spam"]);
    let outcome = validator.check("spam then scam").await;

    // Earliest match in the text wins.
    assert_eq!(outcome, Outcome::invalid("banned keyword \"spam\""));
}

#[tokio::test]
async fn multi_word_keyword_needs_consecutive_words() {
    let validator = KeywordValidator::new(["Free Money"]);

    assert!(!validator.check("get free   money today").await.is_valid());
    assert!(validator.check("free tasty money").await.is_valid());
    assert_eq!(validator.keywords(), vec!["free money"]);
}

#[tokio::test]
async fn blank_keywords_are_ignored() {
    let validator = KeywordValidator::new(["", "  ", "!!"]);
    assert!(validator.is_empty());
    assert!(validator.check("anything at all").await.is_valid());
}

// --- URL Validator ---

#[tokio::test]
async fn blocked_host_and_its_subdomains_are_rejected() {
    let validator = UrlValidator::new(UrlPolicy {
        blocked_hosts: vec!["Evil.Test".to_string()],
        ..UrlPolicy::default()
    });

    let outcome = validator.check("visit evil.test").await;
    assert!(outcome.reason().unwrap().contains("evil.test"));
    assert!(!validator.check("see https://cdn.evil.test/x").await.is_valid());
    assert!(validator.check("see https://notevil.test/x").await.is_valid());
}

#[tokio::test]
async fn disallowed_schemes_are_rejected() {
    let validator = UrlValidator::new(UrlPolicy::default());

    assert!(!validator.check("click javascript:alert(1)").await.is_valid());
    assert!(!validator.check("get ftp://files.example.com/a").await.is_valid());
    assert!(validator.check("read https://example.com/salad").await.is_valid());
}

#[tokio::test]
async fn private_address_literals_are_rejected() {
    let validator = UrlValidator::new(UrlPolicy::default());
    assert!(!validator.check("http://127.0.0.1:8080/admin").await.is_valid());
    assert!(!validator.check("http://192.168.1.1").await.is_valid());
}

#[tokio::test]
async fn mapped_and_link_local_ipv6_literals_are_rejected() {
    let validator = UrlValidator::new(UrlPolicy::default());
    for text in [
        "http://[::ffff:127.0.0.1]/",
        "http://[::ffff:10.0.0.1]/admin",
        "http://[fe80::1]/",
        "http://100.64.0.1/",
        "http://0.0.0.0/",
    ] {
        assert!(!validator.check(text).await.is_valid(), "{text} accepted");
    }
    assert!(validator.check("http://[2606:2800:220:1::]/").await.is_valid());
}

#[tokio::test]
async fn blocked_host_glued_to_punctuation_is_still_found() {
    let validator = UrlValidator::new(UrlPolicy {
        blocked_hosts: vec!["evil.test".to_string()],
        ..UrlPolicy::default()
    });

    for text in [
        "visit evil.test,now",
        "visit evil.test;now",
        "see:evil.test",
        "\u{ab}evil.test\u{bb}",
        "go to 'evil.test'",
        "see:https://evil.test/x",
    ] {
        let outcome = validator.check(text).await;
        assert!(!outcome.is_valid(), "{text} accepted");
        assert!(outcome.reason().unwrap().contains("evil.test"));
    }
}

#[tokio::test]
async fn javascript_url_is_reported_with_its_closing_paren() {
    let validator = UrlValidator::new(UrlPolicy::default());
    let outcome = validator.check("click javascript:alert(1) now").await;
    assert!(outcome.reason().unwrap().contains("javascript:alert(1)"));
}

#[tokio::test]
async fn allow_list_rejects_other_hosts() {
    let validator = UrlValidator::new(UrlPolicy {
        allowed_hosts: vec!["example.com".to_string()],
        ..UrlPolicy::default()
    });

    assert!(validator.check("https://www.example.com/r").await.is_valid());
    let outcome = validator.check("https://other.org/r").await;
    assert!(outcome.reason().unwrap().contains("other.org"));
}

#[tokio::test]
async fn text_without_urls_is_valid() {
    let validator = UrlValidator::new(UrlPolicy::default());
    assert!(validator.check("toss 3.5 cups of greens, e.g. kale").await.is_valid());
}

#[tokio::test]
async fn slow_resolution_times_out_closed() {
    let validator = UrlValidator::with_resolver(
        UrlPolicy {
            resolve_hosts: true,
            timeout: Duration::from_millis(50),
            ..UrlPolicy::default()
        },
        Arc::new(SlowResolver),
    );

    let outcome = validator.check("see https://slow.example").await;
    assert_eq!(outcome, Outcome::TimedOut);
    assert_eq!(outcome.reason(), Some(TIMEOUT_REASON));
}

#[tokio::test]
async fn transient_dns_failure_is_retried_once() {
    let resolver = Arc::new(FlakyResolver {
        failures: 1,
        answer: vec!["93.184.216.34".parse().unwrap()],
        calls: AtomicUsize::new(0),
    });
    let validator = UrlValidator::with_resolver(
        UrlPolicy {
            resolve_hosts: true,
            ..UrlPolicy::default()
        },
        resolver.clone(),
    );

    assert!(validator.check("https://flaky.example").await.is_valid());
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn repeated_transient_failure_becomes_timeout() {
    let resolver = Arc::new(FlakyResolver {
        failures: 10,
        answer: vec![],
        calls: AtomicUsize::new(0),
    });
    let validator = UrlValidator::with_resolver(
        UrlPolicy {
            resolve_hosts: true,
            ..UrlPolicy::default()
        },
        resolver.clone(),
    );

    assert_eq!(validator.check("https://down.example").await, Outcome::TimedOut);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn host_resolving_to_private_address_is_rejected() {
    let resolver = Arc::new(FlakyResolver {
        failures: 0,
        answer: vec!["10.0.0.7".parse().unwrap()],
        calls: AtomicUsize::new(0),
    });
    let validator = UrlValidator::with_resolver(
        UrlPolicy {
            resolve_hosts: true,
            ..UrlPolicy::default()
        },
        resolver,
    );

    let outcome = validator.check("https://internal.example").await;
    assert!(outcome.reason().unwrap().contains("private address"));
}

// --- Content Interactor ---

#[tokio::test]
async fn banned_keyword_blocks_create_without_reaching_the_service() {
    let (interactor, service) = spam_and_evil_pipeline();

    let err = interactor.create(salad("buy spam now", "")).await.unwrap_err();

    match err {
        AppError::ValidationFailed(reason) => assert!(reason.contains("spam")),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(service.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blocked_url_blocks_create_and_names_the_url() {
    let (interactor, service) = spam_and_evil_pipeline();

    let err = interactor
        .create(salad("Greek", "visit evil.test"))
        .await
        .unwrap_err();

    match err {
        AppError::ValidationFailed(reason) => {
            assert!(reason.contains("evil.test"));
            assert!(reason.starts_with("description"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(service.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn clean_content_delegates_exactly_once() {
    let (interactor, service) = spam_and_evil_pipeline();

    interactor
        .create(salad("Greek", "plain recipe text"))
        .await
        .unwrap();
    interactor
        .update(salad("Greek", "still plain"))
        .await
        .unwrap();

    assert_eq!(service.creates.load(Ordering::SeqCst), 1);
    assert_eq!(service.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_is_gated_like_create() {
    let (interactor, service) = spam_and_evil_pipeline();

    assert!(interactor.update(salad("spam salad", "")).await.is_err());
    assert_eq!(service.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn first_rejection_short_circuits_later_validators() {
    let service = Arc::new(CountingService::default());
    let first = ScriptedValidator::new(Outcome::invalid("nope"));
    let second = ScriptedValidator::new(Outcome::Valid);
    let interactor = ContentInteractor::<Salad>::new(
        service.clone(),
        vec![
            first.clone() as Arc<dyn Validator>,
            second.clone() as Arc<dyn Validator>,
        ],
    );

    assert!(interactor.create(salad("a", "b")).await.is_err());
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn validator_timeout_surfaces_as_timeout_error() {
    let service = Arc::new(CountingService::default());
    let timing_out = ScriptedValidator::new(Outcome::TimedOut);
    let interactor = ContentInteractor::<Salad>::new(service.clone(), vec![timing_out as Arc<dyn Validator>]);

    assert_eq!(
        interactor.create(salad("a", "b")).await,
        Err(AppError::ValidatorTimeout)
    );
    assert_eq!(service.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejection_is_reproducible() {
    let (interactor, _) = spam_and_evil_pipeline();
    let input = salad("spam", "visit evil.test");

    let first = interactor.create(input.clone()).await;
    let second = interactor.create(input).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn reads_bypass_validation() {
    let (interactor, service) = spam_and_evil_pipeline();

    // Stored text that would fail validation still comes back.
    let found = interactor.get_by_id(Uuid::new_v4()).await.unwrap();
    assert_eq!(found.name, "buy spam now");
    assert_eq!(service.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn salad_fields_are_validated_name_first() {
    let s = salad("n", "d");
    let fields: Vec<&str> = s.text_fields().into_iter().map(|(field, _)| field).collect();
    assert_eq!(fields, vec!["name", "description"]);
}
