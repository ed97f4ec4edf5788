use leptos::*;
use listening_dashboard::analytics::summarize;
use listening_dashboard::api::HttpSource;
use listening_dashboard::catalog::{load_genres, refresh_catalog, CatalogCache};
use listening_dashboard::charts::UserDashboard;
use listening_dashboard::config::DashboardConfig;
use listening_dashboard::error::CatalogError;
use listening_dashboard::models::{GenreMap, UserGenres};
use std::cell::RefCell;
use std::rc::Rc;

const CONFIG: &str = include_str!("../dashboard.toml");

fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    mount_to_body(|| view! { <App/> })
}

#[component]
fn App() -> impl IntoView {
    let config = match DashboardConfig::from_toml_str(CONFIG) {
        Ok(config) => Rc::new(config),
        Err(e) => {
            tracing::error!("{}", e);
            return view! { <div class="app-container"><p class="error">{e.to_string()}</p></div> }.into_view();
        }
    };

    let source = HttpSource::new();
    let cache = Rc::new(RefCell::new(CatalogCache::new()));
    let (reload, set_reload) = create_signal(0u32);
    let (selected, set_selected) = create_signal(None::<String>);

    // User names of the current catalog; the records themselves stay in the cache.
    let catalog = {
        let (config, source, cache) = (config.clone(), source.clone(), cache.clone());
        create_local_resource(
            move || reload.get(),
            move |_| {
                let (config, source, cache) = (config.clone(), source.clone(), cache.clone());
                async move {
                    match refresh_catalog(&cache, &source, &config.layout, config.load_strategy).await {
                        Ok(records) => Ok(records.iter().map(|r| r.user.clone()).collect::<Vec<_>>()),
                        Err(CatalogError::Superseded) => Ok(cache.borrow().users()),
                        Err(e) => {
                            tracing::error!("Catalog load failed: {}", e);
                            Err(e.to_string())
                        }
                    }
                }
            },
        )
    };

    // Tagged with the user they were loaded for.
    let genres = {
        let (config, source) = (config.clone(), source.clone());
        create_local_resource(
            move || selected.get(),
            move |user: Option<String>| {
                let (config, source) = (config.clone(), source.clone());
                async move {
                    match user {
                        Some(user) => {
                            let genres = load_genres(&source, &config.layout, &user).await;
                            UserGenres::new(user, genres)
                        }
                        None => UserGenres::default(),
                    }
                }
            },
        )
    };

    let on_reload = {
        let cache = cache.clone();
        move |_: ev::MouseEvent| {
            cache.borrow_mut().invalidate();
            set_selected.set(None);
            set_reload.update(|n| *n += 1);
        }
    };

    let picker = move || match catalog.get() {
        None => view! { <p>"Loading..."</p> }.into_view(),
        Some(Err(e)) => view! { <p class="error">{e}</p> }.into_view(),
        Some(Ok(users)) => {
            let current = selected.get_untracked();
            view! {
                <select
                    id="user-select"
                    disabled=move || catalog.loading().get()
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        set_selected.set(if value.is_empty() { None } else { Some(value) });
                    }
                >
                    <option value="">"Select a user"</option>
                    {users.into_iter().map(|u| {
                        let is_current = current.as_deref() == Some(u.as_str());
                        view! { <option value=u.clone() selected=is_current>{u}</option> }
                    }).collect_view()}
                </select>
            }
            .into_view()
        }
    };

    let dashboard = {
        let (config, cache) = (config.clone(), cache.clone());
        move || {
            // Re-run once a reload lands; the cache itself is not reactive.
            catalog.get()?.ok()?;
            let user = selected.get()?;
            let record = cache.borrow().find(&user)?;
            let genres = genres
                .get()
                .and_then(|loaded| loaded.for_user(&user).cloned())
                .unwrap_or_else(GenreMap::default);
            let summary = summarize(&record, &genres, &config.limits);
            Some(view! { <UserDashboard summary=summary/> })
        }
    };

    view! {
        <div class="app-container">
            <header>
                <h1>"Listening Dashboard"</h1>
                <button on:click=on_reload>"Reload"</button>
            </header>
            <main>
                {picker}
                {dashboard}
            </main>
        </div>
    }
    .into_view()
}
