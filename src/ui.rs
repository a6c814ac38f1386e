use crate::goal::progress_percent;
use crate::models::HomeSummary;

pub fn render_index(home: &HomeSummary) -> String {
    let steps = home
        .steps_today
        .map(|total| total.to_string())
        .unwrap_or_else(|| "--".to_string());
    let weight = home
        .latest_weight
        .as_ref()
        .map(|entry| format!("{:.1} lb", entry.weight))
        .unwrap_or_else(|| "No entries".to_string());
    let change = home
        .weekly_weight_change
        .map(|delta| format!("{delta:+.1} lb this week"))
        .unwrap_or_else(|| "Not enough data".to_string());

    INDEX_HTML
        .replace("{{DATE}}", &home.date)
        .replace("{{STEPS}}", &steps)
        .replace("{{STEPS_GOAL}}", &home.steps_goal.to_string())
        .replace(
            "{{STEPS_PCT}}",
            &format!(
                "{:.0}",
                progress_percent(home.steps_today.unwrap_or(0), home.steps_goal)
            ),
        )
        .replace("{{WATER}}", &home.water_today_ml.to_string())
        .replace("{{WATER_GOAL}}", &home.water_goal_ml.to_string())
        .replace(
            "{{WATER_PCT}}",
            &format!(
                "{:.0}",
                progress_percent(home.water_today_ml, home.water_goal_ml)
            ),
        )
        .replace("{{WEIGHT}}", &weight)
        .replace("{{WEIGHT_CHANGE}}", &change)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Wellth</title>
  <style>
    :root {
      --bg: #f1f5f9;
      --ink: #0f172a;
      --muted: #64748b;
      --steps: #3b82f6;
      --water: #06b6d4;
      --weight: #8b5cf6;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(15, 23, 42, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(720px, 100%);
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: clamp(2rem, 4vw, 2.6rem);
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 22px 24px;
      display: grid;
      gap: 8px;
    }

    .card h2 {
      margin: 0;
      font-size: 1.1rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
    }

    .value {
      font-size: 2.2rem;
      font-weight: 600;
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: #e2e8f0;
      overflow: hidden;
    }

    .bar span {
      display: block;
      height: 100%;
    }

    .steps h2, .steps .value { color: var(--steps); }
    .steps .bar span { background: var(--steps); }
    .water h2, .water .value { color: var(--water); }
    .water .bar span { background: var(--water); }
    .weight h2, .weight .value { color: var(--weight); }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Wellth</h1>
      <p class="subtitle">Today is {{DATE}}</p>
    </header>

    <section class="card steps">
      <h2>Steps</h2>
      <div class="value">{{STEPS}}</div>
      <div class="bar"><span style="width: {{STEPS_PCT}}%"></span></div>
      <p class="subtitle">{{STEPS_PCT}}% of {{STEPS_GOAL}} steps</p>
    </section>

    <section class="card water">
      <h2>Water</h2>
      <div class="value">{{WATER}} ml</div>
      <div class="bar"><span style="width: {{WATER_PCT}}%"></span></div>
      <p class="subtitle">{{WATER_PCT}}% of {{WATER_GOAL}} ml</p>
    </section>

    <section class="card weight">
      <h2>Weight</h2>
      <div class="value">{{WEIGHT}}</div>
      <p class="subtitle">{{WEIGHT_CHANGE}}</p>
    </section>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightEntry;
    use chrono::NaiveDate;

    #[test]
    fn renders_progress_and_placeholders() {
        let home = HomeSummary {
            date: "2026-10-19".into(),
            steps_today: None,
            steps_goal: 10_000,
            water_today_ml: 500,
            water_goal_ml: 2_000,
            latest_weight: Some(WeightEntry {
                date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                weight: 164.25,
            }),
            weekly_weight_change: Some(-1.5),
        };
        let html = render_index(&home);
        assert!(html.contains("Today is 2026-10-19"));
        assert!(html.contains(">--<"));
        assert!(html.contains("25% of 2000 ml"));
        assert!(html.contains("-1.5 lb this week"));
        assert!(!html.contains("{{"));
    }
}
