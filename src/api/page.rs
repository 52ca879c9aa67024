//! The single dashboard page
//!
//! The page is static markup plus a script that fetches `/api/v1/dashboard`
//! whenever a control changes and redraws every region with Plotly. Regions
//! whose data is missing from the response are left blank.

use crate::config::{DARK_BLUE, DARK_ORANGE, DASHBOARD_TITLE};
use crate::metrics::comparison::COMPARISON_HEADERS;
use crate::metrics::resample::Granularity;
use crate::models::Service;

use super::service::ALL_SERVICES;

const HEADING: &str = "Tracking MTA Recovery: Ridership Trends and Insights";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const KEY_INSIGHTS: &str = "<b>Key Insights:</b> Metro-North and Access-A-Ride have shown the strongest recovery, \
exceeding pre-pandemic ridership levels, with Metro-North now at 135.5% and Access-A-Ride at 124.6% of their \
pre-pandemic values. Bridges &amp; Tunnels have also surpassed pre-pandemic levels at 109.2%. In contrast, Subways \
and Buses are recovering more slowly, with current ridership at 84.0% and 72.8% of pre-pandemic levels, respectively.";

/// Render the dashboard page
pub fn render_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{plotly}"></script>
    <style>{css}</style>
</head>
<body>
    <h2 id="report_title">{heading}</h2>
    <div class="controls">
        <label>Select a Report Granularity:
            <select id="granularity">{granularity_options}</select>
        </label>
        <label>Services:
            <select id="services" multiple size="4">{service_options}</select>
        </label>
    </div>
    <div class="tabs">
        <button class="tab active" data-tab="overview">Overview &amp; Key Metrics</button>
        <button class="tab" data-tab="recovery">Service Recovery Analysis</button>
        <button class="tab" data-tab="comparisons">Ridership Comparisons</button>
        <button class="tab" data-tab="trends">Detailed Service Trends</button>
        <button class="tab" data-tab="next">What's Next?</button>
    </div>
    <section class="panel active" id="overview">
        <p class="insights">{insights}</p>
        <div class="card-row" id="kpi_cards"></div>
        <div class="card-row" id="ridership_cards"></div>
        <div class="chart" id="service_line"></div>
    </section>
    <section class="panel" id="recovery">
        <div class="chart-row">
            <div class="chart" id="recovery_bar"></div>
            <div class="chart" id="correlation"></div>
        </div>
        <div class="chart" id="recovery_heatmap"></div>
    </section>
    <section class="panel" id="comparisons">
        <div class="chart-row">
            <div class="chart" id="ridership_pie"></div>
            <div class="chart" id="before_after"></div>
        </div>
        <table id="comparison_table">
            <thead><tr>{comparison_headers}</tr></thead>
            <tbody></tbody>
        </table>
    </section>
    <section class="panel" id="trends">
        <div class="chart" id="dual_axis"></div>
        <div class="chart" id="scatter"></div>
        <div class="chart" id="variability"></div>
    </section>
    <section class="panel" id="next">{whats_next}</section>
    <script>{js}</script>
</body>
</html>"#,
        title = DASHBOARD_TITLE,
        plotly = PLOTLY_CDN,
        heading = HEADING,
        css = inline_css(),
        granularity_options = granularity_options(),
        service_options = service_options(),
        insights = KEY_INSIGHTS,
        comparison_headers = COMPARISON_HEADERS
            .iter()
            .map(|h| format!("<th>{}</th>", html_escape(h)))
            .collect::<String>(),
        whats_next = whats_next(),
        js = inline_javascript(),
    )
}

fn granularity_options() -> String {
    Granularity::EXPOSED
        .iter()
        .map(|g| {
            let selected = if *g == Granularity::Month { " selected" } else { "" };
            format!(r#"<option value="{g}"{selected}>{g}</option>"#)
        })
        .collect()
}

fn service_options() -> String {
    let mut options = format!(r#"<option value="{ALL_SERVICES}" selected>All services</option>"#);
    for service in Service::ALL {
        let name = html_escape(service.name());
        options.push_str(&format!(r#"<option value="{name}">{name}</option>"#));
    }
    options
}

fn whats_next() -> &'static str {
    r#"
<h4>What's Next?</h4>
<ul>
    <li><b>Metro-North</b> and <b>Access-A-Ride</b> have shown significant recovery, exceeding pre-pandemic ridership levels. This suggests a stable and growing need for suburban and accessible transport options.</li>
    <li><b>Congestion Charge Impact:</b> Starting in January 2025, New York City will implement the first congestion charge in North America, aimed at reducing traffic in highly congested areas of the city. Driving into the city at peak hours becomes more expensive. The policy is expected to:
        <ul>
            <li>Reduce the volume of private cars on the road, potentially lowering the demand for <b>Bridges and Tunnels</b>.</li>
            <li>Increase ridership on <b>Subways</b>, <b>Buses</b>, <b>Metro-North</b> and <b>LIRR</b> as commuters seek more affordable alternatives to driving.</li>
            <li><b>Impact recovery trends:</b> services that have not yet returned to pre-pandemic levels, such as <b>Buses</b> and <b>Staten Island Railway</b>, might see significant growth post-2025.</li>
            <li><b>Projections:</b> if a significant share of car users switch to public transportation, recovery for <b>Subways</b> and <b>Buses</b> could exceed 100% of pre-pandemic ridership.</li>
            <li><b>Monitor Effects of Congestion Pricing:</b> after the charge starts, transit usage should be monitored and service offerings adjusted accordingly.</li>
        </ul>
    </li>
    <li><b>Return to Office Trends:</b> as more companies adopt hybrid or return-to-office schedules, <b>Metro-North</b> and <b>LIRR</b> are likely to see further increases in ridership.</li>
    <li><b>Infrastructure Investment:</b> the <b>MTA</b> should prioritize train, track and signal reliability to keep commuters using public transit.</li>
    <li><b>Accessibility Improvements:</b> resuming the <b>23 subway station elevator projects</b> that were put on hold would directly help riders relying on Access-A-Ride and those with mobility challenges.</li>
    <li><b>Cost Control and Fare Evasion Measures:</b> keeping fares affordable while reducing <b>fare evasion</b> frees funds for service reliability.</li>
</ul>
"#
}

fn inline_css() -> String {
    format!(
        r#"
body {{
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    margin: 0;
    padding: 10px 20px;
    color: #1f2937;
}}
#report_title {{
    background: {blue};
    color: #fff;
    padding: 0.5rem;
    text-align: center;
}}
.controls {{ display: flex; gap: 2rem; margin-bottom: 0.8em; }}
.tabs {{ display: flex; gap: 0.25rem; border-bottom: 1px solid #d1d5db; }}
.tab {{ border: none; background: none; padding: 0.5rem 1rem; cursor: pointer; }}
.tab.active {{ border-bottom: 3px solid {blue}; font-weight: 600; }}
.panel {{ display: none; padding: 1rem 0; }}
.panel.active {{ display: block; }}
.insights {{ font-size: 0.8em; }}
.card-row {{ display: flex; flex-wrap: wrap; gap: 0.8em; margin-bottom: 0.8em; }}
.card {{
    border: 1px solid #e5e7eb;
    border-radius: 15px;
    padding: 0.4em 0.8em;
    min-width: 150px;
    text-align: center;
}}
.card .label {{ font-size: 12px; margin: 0; }}
.card .value {{ font-size: 1.25em; font-weight: bold; margin: 0; }}
.card .detail {{ font-size: 0.9em; margin: 0; }}
.card.up .value, .card.up .detail {{ color: {blue}; }}
.card.down .value, .card.down .detail {{ color: {orange}; }}
.chart-row {{ display: flex; flex-wrap: wrap; }}
.chart-row .chart {{ flex: 1 1 480px; }}
table {{ border-collapse: collapse; width: 100%; font-size: 14px; }}
th, td {{ border: 1px solid #e5e7eb; padding: 0.3rem 0.6rem; text-align: right; }}
th:first-child, td:first-child {{ text-align: left; }}
"#,
        blue = DARK_BLUE,
        orange = DARK_ORANGE,
    )
}

fn inline_javascript() -> &'static str {
    r#"
(function() {
    const chartConfig = { displayModeBar: false, responsive: true };

    function selectedServices() {
        const picked = Array.from(document.querySelectorAll('#services option:checked')).map(o => o.value);
        if (picked.length === 0 || picked.includes('all_services')) {
            return 'all_services';
        }
        return picked.join(',');
    }

    function card(label, value, detail, tone) {
        const el = document.createElement('div');
        el.className = 'card' + (tone ? ' ' + tone : '');
        el.innerHTML = '<p class="label"></p><p class="value"></p><p class="detail"></p>';
        el.querySelector('.label').textContent = label;
        el.querySelector('.value').textContent = value;
        el.querySelector('.detail').textContent = detail || '';
        return el;
    }

    function renderKpis(kpis) {
        const row = document.getElementById('kpi_cards');
        row.replaceChildren();
        if (!kpis) return;
        row.append(
            card('Highest Ridership', kpis.total_ridership, kpis.highest_ridership_day),
            card('Overall Ridership Recovery', kpis.total_recovery),
            card('Top Recovered Service', kpis.recovery_percentage, kpis.top_service),
            card('Year-over-Year Growth', kpis.yoy_growth),
            card('Avg Lockdown Ridership', kpis.avg_lockdown_ridership),
            card('Avg Post-Lockdown Ridership', kpis.avg_post_lockdown_ridership),
        );
    }

    function renderCards(cards) {
        const row = document.getElementById('ridership_cards');
        row.replaceChildren();
        (cards || []).forEach((c, i) => {
            const tone = c.change.includes('↑') ? 'up' : c.change.includes('↓') ? 'down' : '';
            const el = card(c.service + ' · ' + c.heading, c.value, c.change, tone);
            const spark = document.createElement('div');
            spark.id = 'sparkline_' + i;
            el.append(spark);
            row.append(el);
            Plotly.react(spark, c.sparkline.data, c.sparkline.layout, chartConfig);
        });
    }

    function renderCharts(charts) {
        document.querySelectorAll('.chart').forEach(el => {
            const figure = charts ? charts[el.id] : null;
            if (figure) {
                Plotly.react(el, figure.data, figure.layout, chartConfig);
            } else {
                Plotly.purge(el);
            }
        });
    }

    function renderComparison(rows) {
        const body = document.querySelector('#comparison_table tbody');
        body.replaceChildren();
        (rows || []).forEach(row => {
            const tr = document.createElement('tr');
            Object.values(row).forEach(value => {
                const td = document.createElement('td');
                td.textContent = value;
                tr.append(td);
            });
            body.append(tr);
        });
    }

    async function refresh() {
        const params = new URLSearchParams({
            granularity: document.getElementById('granularity').value,
            services: selectedServices(),
        });
        try {
            const response = await fetch('/api/v1/dashboard?' + params);
            const bundle = response.ok ? await response.json() : {};
            renderKpis(bundle.kpis);
            renderCards(bundle.cards);
            renderCharts(bundle.charts);
            renderComparison(bundle.comparison);
        } catch (err) {
            console.error('Dashboard refresh failed', err);
            renderCharts(null);
        }
    }

    document.querySelectorAll('.tab').forEach(tab => {
        tab.addEventListener('click', () => {
            document.querySelectorAll('.tab, .panel').forEach(el => el.classList.remove('active'));
            tab.classList.add('active');
            document.getElementById(tab.dataset.tab).classList.add('active');
            window.dispatchEvent(new Event('resize'));
        });
    });
    document.getElementById('granularity').addEventListener('change', refresh);
    document.getElementById('services').addEventListener('change', refresh);
    refresh();
})();
"#
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
