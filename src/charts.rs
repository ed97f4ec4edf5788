use leptos::*;
use crate::analytics::{MonthTopTrack, MonthlyMinutes, PlaylistSize, RankedItem, TimeOfDayAverage, UserSummary};

const PALETTE: [&str; 6] = ["var(--primary)", "var(--secondary)", "var(--accent)", "#98971a", "#8ec07c", "#d3869b"];

#[component]
pub fn UserDashboard(summary: UserSummary) -> impl IntoView {
    view! {
        <div style="display: flex; flex-direction: column; gap: 30px; padding-bottom: 50px;">
            <h2>{summary.user}</h2>
            <PlaylistChart playlists=summary.playlists/>
            <div class="grid-container" style="grid-template-columns: 1fr 1fr; gap: 20px;">
                <ArtistTiles artists=summary.top_artists/>
                <GenreMix genres=summary.genres/>
            </div>
            <TimeOfDayChart buckets=summary.time_of_day/>
            <MonthlyChart months=summary.monthly/>
            <TopTracksList tracks=summary.top_tracks/>
            <SearchTerms terms=summary.searches/>
        </div>
    }
}

fn empty_note(text: &'static str) -> View {
    view! { <p style="font-size: 0.7rem; color: #a89984;">{text}</p> }.into_view()
}

// Bar per playlist, height by track count.
#[component]
pub fn PlaylistChart(playlists: Vec<PlaylistSize>) -> impl IntoView {
    let max = playlists.iter().map(|p| p.count).max().unwrap_or(1).max(1);
    view! {
        <section class="card">
            <h3 class="stat-label">"Tracks per Playlist"</h3>
            {if playlists.is_empty() { empty_note("No playlists.") } else {
                view! {
                    <div style="display: flex; align-items: flex-end; gap: 6px; height: 120px; margin-top: 15px;">
                        {playlists.iter().map(|p| {
                            let h = (p.count as f64 / max as f64) * 100.0;
                            view! { <div style=format!("flex: 1; height: {}%; background: steelblue; border-radius: 2px 2px 0 0;", h) title=format!("{}: {} tracks", p.name, p.count)></div> }
                        }).collect_view()}
                    </div>
                }.into_view()
            }}
        </section>
    }
}

/// Treemap-ish: tiles grow with the artist's share of library tracks.
#[component]
pub fn ArtistTiles(artists: Vec<RankedItem>) -> impl IntoView {
    view! {
        <section class="card">
            <h3 class="stat-label">"Top Library Artists"</h3>
            {if artists.is_empty() { empty_note("No library data.") } else {
                view! {
                    <div style="display: flex; flex-wrap: wrap; gap: 2px; height: 200px; margin-top: 15px;">
                        {artists.iter().enumerate().map(|(i, a)| {
                            view! {
                                <div style=format!("flex: {} 1 60px; background: {}; color: white; font-size: 0.7rem; padding: 4px; overflow: hidden; text-overflow: ellipsis;", a.value, PALETTE[i % PALETTE.len()]) title=format!("{}: {}", a.name, a.value)>
                                    {a.name.clone()}
                                </div>
                            }
                        }).collect_view()}
                    </div>
                }.into_view()
            }}
        </section>
    }
}

#[component]
pub fn GenreMix(genres: Vec<RankedItem>) -> impl IntoView {
    let total: usize = genres.iter().map(|g| g.value).sum();
    view! {
        <section class="card">
            <h3 class="stat-label">"Genre Mix"</h3>
            {if genres.is_empty() { empty_note("No genre data.") } else {
                view! {
                    <div style="display: flex; height: 30px; border-radius: 15px; overflow: hidden; margin-top: 15px;">
                        {genres.iter().enumerate().map(|(i, g)| {
                            let w = (g.value as f64 / total as f64) * 100.0;
                            view! { <div style=format!("width: {}%; background: {}; height: 100%;", w, PALETTE[i % PALETTE.len()]) title=format!("{}: {}%", g.name, w as i32)></div> }
                        }).collect_view()}
                    </div>
                    <div style="display: flex; flex-wrap: wrap; gap: 10px; margin-top: 10px; font-size: 0.6rem; font-weight: bold;">
                        {genres.iter().map(|g| view! { <span>{g.name.to_uppercase()}</span> }).collect_view()}
                    </div>
                }.into_view()
            }}
        </section>
    }
}

#[component]
pub fn TimeOfDayChart(buckets: Vec<TimeOfDayAverage>) -> impl IntoView {
    let max = buckets.iter().map(|b| b.mean_seconds).fold(0.0_f64, f64::max).max(1.0);
    view! {
        <section class="card">
            <h3 class="stat-label">"Average Play Length by Time of Day"</h3>
            <div style="display: flex; align-items: flex-end; gap: 10px; height: 120px; margin-top: 15px; padding: 0 10px;">
                {buckets.iter().map(|b| {
                    let h = (b.mean_seconds / max) * 100.0;
                    view! {
                        <div style="flex: 1; display: flex; flex-direction: column; height: 100%; justify-content: flex-end; align-items: center; gap: 5px;">
                            <div style=format!("width: 100%; height: {}%; background: var(--accent); border-radius: 4px 4px 0 0;", h) title=format!("{:.0}s over {} plays", b.mean_seconds, b.events)></div>
                            <span style="font-size: 0.5rem; font-weight: bold; color: #a89984;">{b.label.clone()}</span>
                        </div>
                    }
                }).collect_view()}
            </div>
        </section>
    }
}

#[component]
pub fn MonthlyChart(months: Vec<MonthlyMinutes>) -> impl IntoView {
    let max = months.iter().map(|m| m.minutes).fold(0.0_f64, f64::max).max(1.0);
    view! {
        <section class="card">
            <h3 class="stat-label">"Minutes Listened per Month"</h3>
            {if months.is_empty() { empty_note("No music history.") } else {
                view! {
                    <div style="display: flex; align-items: flex-end; gap: 4px; height: 120px; margin-top: 15px;">
                        {months.iter().map(|m| {
                            let h = (m.minutes / max) * 100.0;
                            view! {
                                <div style="flex: 1; height: 100%; display: flex; flex-direction: column; justify-content: flex-end;" title=format!("{}: {:.0} min", m.month.short_label(), m.minutes)>
                                    <div style=format!("height: 3px; margin-bottom: {}%; background: var(--primary); border-radius: 2px;", h)></div>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                }.into_view()
            }}
        </section>
    }
}

#[component]
pub fn TopTracksList(tracks: Vec<MonthTopTrack>) -> impl IntoView {
    view! {
        <section class="card">
            <h3 class="stat-label">"Top Track of Each Month"</h3>
            <div style="display: flex; flex-direction: column; gap: 8px; margin-top: 15px;">
                {tracks.iter().map(|t| {
                    view! {
                        <div style="display: flex; justify-content: space-between; font-size: 0.8rem; border-bottom: 1px solid var(--surface); padding-bottom: 4px;">
                            <span style="width: 70px; color: #a89984;">{t.month.to_string()}</span>
                            <span style="white-space: nowrap; overflow: hidden; text-overflow: ellipsis; flex: 1;">{format!("{} - {}", t.track, t.artist)}</span>
                            <span style="font-weight: 900; color: var(--accent);">{t.ms_played / 60_000}"m"</span>
                        </div>
                    }
                }).collect_view()}
            </div>
        </section>
    }
}

#[component]
pub fn SearchTerms(terms: Vec<RankedItem>) -> impl IntoView {
    let max = terms.iter().map(|t| t.value).max().unwrap_or(1).max(1);
    view! {
        <section class="card">
            <h3 class="stat-label">"Top Searches"</h3>
            {if terms.is_empty() { empty_note("No searches.") } else {
                view! {
                    <div style="display: flex; flex-direction: column; gap: 6px; margin-top: 15px;">
                        {terms.iter().map(|t| {
                            let w = (t.value as f64 / max as f64) * 100.0;
                            view! {
                                <div style="display: flex; align-items: center; gap: 8px; font-size: 0.7rem;">
                                    <span style="width: 120px; overflow: hidden; text-overflow: ellipsis;">{t.name.clone()}</span>
                                    <div style=format!("width: {}%; height: 8px; background: var(--secondary); border-radius: 4px;", w)></div>
                                    <span>{t.value}</span>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                }.into_view()
            }}
        </section>
    }
}
