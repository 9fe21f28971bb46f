#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Operator-facing presentation: the dashboard document served on `/` and a
//! text gauge for terminal output.

/// Self-contained dashboard page. Polls `/data` and `/history` once a second
/// and posts overrides to `/control`.
pub const DASHBOARD_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Solar Tracker</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 1.5rem; background: #111; color: #eee; }
  .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(9rem, 1fr)); gap: .75rem; }
  .card { background: #1d1d1d; border-radius: .5rem; padding: .75rem; }
  .label { font-size: .8rem; color: #999; }
  .value { font-size: 1.6rem; }
  canvas { width: 100%; height: 180px; background: #1d1d1d; border-radius: .5rem; margin-top: 1rem; }
  fieldset { border: 1px solid #333; border-radius: .5rem; margin-top: 1rem; }
</style>
</head>
<body>
<h1>Solar Tracker</h1>
<div class="grid">
  <div class="card"><div class="label">Voltage</div><div class="value"><span id="voltage">-</span> V</div></div>
  <div class="card"><div class="label">Power (est.)</div><div class="value"><span id="power">-</span> W</div></div>
  <div class="card"><div class="label">Angle</div><div class="value"><span id="angle">-</span>&deg;</div></div>
  <div class="card"><div class="label">Mode</div><div class="value" id="mode">-</div></div>
  <div class="card"><div class="label">LDR</div><div class="value" id="ldr">-</div></div>
</div>
<canvas id="chart" width="600" height="180"></canvas>
<fieldset>
  <legend>Manual override</legend>
  <button onclick="send('mode=auto')">Auto</button>
  <button onclick="send('mode=manual')">Manual</button>
  <input id="setpoint" type="range" min="0" max="180" value="90"
         oninput="sp.textContent=this.value" onchange="send('mode=manual&angle='+this.value)">
  <span id="sp">90</span>&deg;
</fieldset>
<script>
const $ = id => document.getElementById(id);
function send(q) { fetch('/control?' + q); }
function draw(samples) {
  const c = $('chart'), g = c.getContext('2d');
  g.clearRect(0, 0, c.width, c.height);
  g.strokeStyle = '#f5b642'; g.lineWidth = 2; g.beginPath();
  samples.forEach((v, i) => {
    const x = i * c.width / (samples.length - 1);
    const y = c.height - (v / 12) * c.height;
    i ? g.lineTo(x, y) : g.moveTo(x, y);
  });
  g.stroke();
}
async function poll() {
  try {
    const d = await (await fetch('/data')).json();
    $('voltage').textContent = d.voltage.toFixed(2);
    $('power').textContent = d.power.toFixed(2);
    $('angle').textContent = d.angle;
    $('mode').textContent = d.mode;
    $('ldr').textContent = d.ldr.join(' ');
    draw(await (await fetch('/history')).json());
  } catch (e) { $('mode').textContent = 'offline'; }
}
setInterval(poll, 1000); poll();
</script>
</body>
</html>
"#;

/// One-line gauge of the axis position, e.g. `[-----|----] 90°`.
///
/// `width` is the number of cells between the brackets (at least 2).
pub fn angle_gauge(angle_deg: i32, width: usize) -> String {
    let width = width.max(2);
    let angle = angle_deg.clamp(0, 180).unsigned_abs() as usize;
    let pos = (angle * (width - 1) + 90) / 180;
    let mut s = String::with_capacity(width + 8);
    s.push('[');
    for i in 0..width {
        s.push(if i == pos { '|' } else { '-' });
    }
    s.push(']');
    s.push_str(&format!(" {angle}°"));
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "[|----] 0°")]
    #[case(90, "[--|--] 90°")]
    #[case(180, "[----|] 180°")]
    #[case(-20, "[|----] 0°")]
    #[case(500, "[----|] 180°")]
    fn gauge_marks_position(#[case] angle: i32, #[case] expected: &str) {
        assert_eq!(angle_gauge(angle, 5), expected);
    }

    #[test]
    fn dashboard_uses_status_routes() {
        for route in ["/data", "/history", "/control?"] {
            assert!(DASHBOARD_HTML.contains(route), "missing {route}");
        }
    }
}
