use std::sync::Arc;
use std::time::Duration;

use applink::{
    Context, ContextOverrides, FnNavigator, NavigationError, NavigationMode, Os, ResolveOptions,
    RuleDocument, StaticLoader, resolve,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let rules = json!({
        "rules": [
            {
                "if": { "os": ["iOS"] },
                "target": { "deepLinkIOS": "myapp://home", "web": "https://example.com/app" },
                "reason": "iOS users"
            },
            {
                "if": { "lang": ["es"], "rollout": { "percentage": 50, "seed": "promo" } },
                "target": { "web": "https://example.com/es/promo" }
            }
        ],
        "default": { "target": { "web": "https://example.com" } },
        "meta": { "version": "1" }
    });

    let doc = RuleDocument::from_value(&rules).expect("failed to validate rules");
    println!("{doc}");

    let report = doc.evaluate_detailed(&Context::new(Os::Android, "es").with_identity("visitor-1"));
    println!("{report}");

    // Print navigations instead of performing them.
    let navigator = FnNavigator(|url: &str, mode: NavigationMode| {
        println!("navigate ({mode}): {url}");
        Ok::<(), NavigationError>(())
    });

    let result = resolve(
        ResolveOptions::new(StaticLoader(rules))
            .id("demo")
            .overrides(ContextOverrides::new().os(Os::Ios).lang("en-US"))
            .navigator(Arc::new(navigator))
            .timeout(Duration::from_millis(300))
            .on_after(|r| println!("settled: {}", r.used)),
    )
    .await
    .expect("failed to resolve");

    println!("{}", result.evaluation);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).expect("failed to serialize result")
    );
}
