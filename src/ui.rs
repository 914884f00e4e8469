use crate::grid::GridView;
use crate::models::{PALETTE, User, WeeklyStats, swatch};
use crate::stats::DashboardStats;
use std::fmt::Write;

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_dashboard(
    view: &GridView,
    user: &User,
    stats: &DashboardStats,
    status: Option<&str>,
) -> String {
    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{USER}}", &escape_html(&user.name))
        .replace("{{WEEK}}", &escape_html(&view.label))
        .replace("{{HEAD}}", &render_head(view))
        .replace("{{ROWS}}", &render_rows(view))
        .replace("{{SCORES}}", &render_scores(view))
        .replace("{{PALETTE}}", &render_palette())
        .replace("{{STATS}}", &render_stats(stats))
        .replace("{{STATUS}}", &escape_html(status.unwrap_or_default()))
}

pub fn render_login(register: bool, error: Option<&str>) -> String {
    let (title, toggle) = if register {
        ("Register", r#"<a href="/login">Already have an account? Log in</a>"#)
    } else {
        ("Login", r#"<a href="/login?mode=register">Create an account</a>"#)
    };
    let register_fields = if register {
        r#"<input name="name" placeholder="Name" required />
      <input name="password_confirmation" type="password" placeholder="Confirm password" required />"#
    } else {
        ""
    };

    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{TITLE}}", title)
        .replace("{{MODE}}", if register { "register" } else { "login" })
        .replace("{{REGISTER_FIELDS}}", register_fields)
        .replace("{{TOGGLE}}", toggle)
        .replace("{{ERROR}}", &escape_html(error.unwrap_or_default()))
}

fn render_head(view: &GridView) -> String {
    let mut out = String::new();
    for day in &view.days {
        let class = if day.is_today { "day today" } else { "day" };
        let _ = write!(
            out,
            r#"<th class="{class}"><span>{}</span><strong>{}</strong></th>"#,
            day.weekday, day.day_of_month
        );
    }
    out
}

fn render_rows(view: &GridView) -> String {
    if view.rows.is_empty() {
        return r#"<tr><td colspan="8" class="empty">No habits active this week.</td></tr>"#.into();
    }

    let mut out = String::new();
    for row in &view.rows {
        let id = escape_html(row.id.as_str());
        let name = escape_html(&row.name);
        let color = escape_html(&row.color);
        let _ = write!(
            out,
            r#"<tr><td class="habit"><i style="background:{color}"></i>{name}
<details><summary>&#8942;</summary>
<form method="post" action="/habits/{id}"><input name="name" value="{name}" required /><input name="color" value="{color}" /><button type="submit">Save</button></form>
<form method="post" action="/habits/{id}/delete" onsubmit="return confirm('Are you sure you want to delete this habit?')"><button class="danger" type="submit">Delete</button></form>
</details></td>"#
        );
        for cell in &row.cells {
            let state = if cell.completed { "done" } else { "open" };
            let mark = if cell.completed { "&#10003;" } else { "" };
            let disabled = if cell.editable { "" } else { " disabled" };
            let _ = write!(
                out,
                r#"<td><form method="post" action="/habits/{id}/toggle"><input type="hidden" name="date" value="{}" /><button class="cell {state}" type="submit"{disabled}>{mark}</button></form></td>"#,
                cell.date
            );
        }
        out.push_str("</tr>\n");
    }
    out
}

fn render_scores(view: &GridView) -> String {
    let mut out = String::new();
    for day in &view.days {
        let _ = write!(
            out,
            r#"<td><span class="score {}">{}%</span></td>"#,
            day.tier.as_str(),
            day.score
        );
    }
    out
}

fn render_palette() -> String {
    PALETTE
        .iter()
        .map(|c| format!(r#"<option value="{c}" style="background:{c}">{c}</option>"#))
        .collect()
}

fn render_stats(stats: &DashboardStats) -> String {
    let mut out = String::new();
    if let Some(weekly) = &stats.weekly {
        let _ = write!(
            out,
            r#"<div class="stat"><span class="label">Completions</span><span class="value">{}</span></div>
<div class="stat"><span class="label">Consistent days</span><span class="value">{} / 7</span></div>
<div class="stat"><span class="label">Current streak</span><span class="value">{}</span></div>"#,
            weekly.weekly_completions, weekly.consistent_days, weekly.current_streak
        );
        out.push_str(&render_distribution(weekly));
    }
    let _ = write!(
        out,
        r#"<div class="stat"><span class="label">Habit velocity</span><span class="value">{}%</span></div>"#,
        stats.latest_percentage.round()
    );
    if !stats.recap_trend.is_empty() {
        out.push_str(r#"<ol class="trend">"#);
        for point in &stats.recap_trend {
            let _ = write!(
                out,
                r#"<li title="{}"><b style="height:{}%"></b></li>"#,
                point.date,
                point.percentage.clamp(0.0, 100.0)
            );
        }
        out.push_str("</ol>");
    }
    out
}

/// Share of this week's completions per habit, widest bar first.
fn render_distribution(weekly: &WeeklyStats) -> String {
    let total: u64 = weekly.distribution.iter().map(|slice| slice.value).sum();
    if total == 0 {
        return String::new();
    }

    let mut slices: Vec<_> = weekly.distribution.iter().filter(|s| s.value > 0).collect();
    slices.sort_by(|a, b| b.value.cmp(&a.value));

    let mut out = String::from(r#"<ul class="distribution">"#);
    for slice in slices {
        let share = slice.value * 100 / total;
        let _ = write!(
            out,
            r#"<li><span>{}</span><b style="width:{share}%;background:{}"></b><em>{}</em></li>"#,
            escape_html(&slice.name),
            swatch(slice.color.as_deref()),
            slice.value
        );
    }
    out.push_str("</ul>");
    out
}

const STYLE: &str = r#"
    :root { --bg: #09090b; --card: #18181b; --line: #27272a; --ink: #f4f4f5; --muted: #a1a1aa; --accent: #6366f1; }
    * { box-sizing: border-box; }
    body { margin: 0; min-height: 100vh; background: var(--bg); color: var(--ink); font-family: "Space Grotesk", "Trebuchet MS", sans-serif; padding: 32px 18px; }
    .app { width: min(960px, 100%); margin: 0 auto; display: grid; gap: 24px; }
    .card { background: var(--card); border: 1px solid var(--line); border-radius: 20px; padding: 24px; }
    header { display: flex; justify-content: space-between; align-items: center; gap: 16px; }
    h1, h2 { margin: 0; }
    .nav { display: flex; gap: 8px; align-items: center; }
    button { border: none; border-radius: 10px; padding: 8px 12px; font-weight: 600; cursor: pointer; background: var(--line); color: var(--ink); }
    button.primary { background: var(--accent); }
    button.danger { background: transparent; color: #f87171; }
    table { width: 100%; border-collapse: collapse; }
    th.day { color: var(--muted); font-size: 0.8rem; }
    th.day span, th.day strong { display: block; }
    th.today { color: #818cf8; }
    td { padding: 6px; text-align: center; border-top: 1px solid var(--line); }
    td.habit { text-align: left; }
    td.habit i { display: inline-block; width: 4px; height: 24px; border-radius: 4px; margin-right: 10px; vertical-align: middle; }
    td.habit details { display: inline-block; margin-left: 8px; }
    td.empty { color: var(--muted); padding: 40px; }
    .cell { width: 40px; height: 40px; }
    .cell.done { background: var(--accent); }
    .cell:disabled { opacity: 0.4; cursor: not-allowed; }
    .score { font-family: monospace; font-size: 0.8rem; padding: 2px 6px; border-radius: 6px; }
    .score.high { color: #34d399; } .score.medium { color: #facc15; } .score.low { color: var(--muted); }
    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 16px; }
    .stat { display: grid; gap: 6px; }
    .stat .label { font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.12em; color: var(--muted); }
    .stat .value { font-size: 1.7rem; font-weight: 600; }
    .trend { display: flex; align-items: flex-end; gap: 6px; height: 80px; list-style: none; padding: 0; }
    .trend li { flex: 1; height: 100%; display: flex; align-items: flex-end; }
    .trend b { display: block; width: 100%; background: #818cf8; border-radius: 4px; }
    .distribution { grid-column: 1 / -1; list-style: none; padding: 0; margin: 0; display: grid; gap: 6px; }
    .distribution li { display: grid; grid-template-columns: 140px 1fr 40px; align-items: center; gap: 10px; }
    .distribution b { display: block; height: 10px; border-radius: 5px; }
    .distribution em { font-style: normal; color: var(--muted); text-align: right; }
    .status { color: #f87171; min-height: 1.2em; }
    form.inline { display: flex; gap: 8px; }
    input, select { background: var(--bg); color: var(--ink); border: 1px solid var(--line); border-radius: 10px; padding: 8px; }
    .login { width: min(420px, 100%); margin: 10vh auto; display: grid; gap: 12px; }
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Dashboard - Habit Grid</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Dashboard</h1>
        <p class="subtitle">Welcome back, {{USER}}!</p>
      </div>
      <form method="post" action="/logout"><button type="submit">Log out</button></form>
    </header>

    <section class="card">
      <header>
        <div>
          <h2>Weekly Focus</h2>
          <p class="subtitle">Focus on today, track your week.</p>
        </div>
        <div class="nav">
          <form method="post" action="/week/prev"><button type="submit">&#8249;</button></form>
          <form method="post" action="/week/today"><button type="submit">{{WEEK}}</button></form>
          <form method="post" action="/week/next"><button type="submit">&#8250;</button></form>
        </div>
      </header>
      <table>
        <thead><tr><th>Habit</th>{{HEAD}}</tr></thead>
        <tbody>{{ROWS}}</tbody>
        <tfoot><tr><td>Daily Score</td>{{SCORES}}</tr></tfoot>
      </table>
      <form class="inline" method="post" action="/habits">
        <input name="name" placeholder="e.g. Read 30 mins" required />
        <select name="color">{{PALETTE}}</select>
        <button class="primary" type="submit">New Habit</button>
      </form>
      <div class="status">{{STATUS}}</div>
    </section>

    <section class="card stats">{{STATS}}</section>
  </main>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} - Habit Grid</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="card login">
    <h1>{{TITLE}}</h1>
    <form class="login" method="post" action="/login">
      <input type="hidden" name="mode" value="{{MODE}}" />
      {{REGISTER_FIELDS}}
      <input name="email" type="email" placeholder="Email" required />
      <input name="password" type="password" placeholder="Password" required />
      <button class="primary" type="submit">{{TITLE}}</button>
    </form>
    <a href="/auth/google">Continue with Google</a>
    {{TOGGLE}}
    <div class="status">{{ERROR}}</div>
  </main>
</body>
</html>
"#;
