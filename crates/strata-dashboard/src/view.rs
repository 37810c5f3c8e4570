//! The browser view served at `GET /`.
//!
//! A single self-contained page. It follows `/ws/frames` (falling back to
//! polling `/api/frame` while the socket is down), draws one `<div>` per
//! row with the row's perspective transform and opacity, colours segments
//! by `color_type` and intensity, and shows the tooltip for the hovered
//! cell by its `"x,y"` key. The buttons call the control endpoints.

/// The complete HTML document.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Strata</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 1.5rem;
            margin: 0;
        }
        h1 { color: #58a6ff; margin: 0 0 0.25rem 0; font-size: 1.3rem; }
        .subtitle { color: #8b949e; margin: 0 0 1rem 0; }
        .bar { display: flex; flex-wrap: wrap; gap: 0.5rem; align-items: center; margin-bottom: 0.75rem; }
        .bar button, .bar select, .bar input {
            background: #161b22;
            color: #c9d1d9;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.3rem 0.7rem;
            font-family: inherit;
        }
        .bar button:hover { border-color: #58a6ff; }
        .bar label { color: #8b949e; }
        .status { color: #8b949e; }
        .status .live { color: #3fb950; font-weight: bold; }
        .status .down { color: #f85149; font-weight: bold; }
        #terrain {
            line-height: 1.05;
            font-size: 13px;
            white-space: pre;
            user-select: none;
        }
        .row { transform-origin: 50% 100%; }
        .c-boundary { color: #30363d; }
        .c-agent { color: #f0f6fc; font-weight: bold; }
        .c-dead { color: #6e7681; }
        .c-label { color: #58a6ff; font-weight: bold; }
        .c-event { color: #f85149; font-weight: bold; }
        .c-high { color: #ff7b72; }
        .c-medium { color: #d29922; }
        .c-low { color: #3fb950; }
        #tooltip {
            position: fixed;
            pointer-events: none;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.4rem 0.6rem;
            white-space: pre;
            display: none;
            font-size: 12px;
        }
    </style>
</head>
<body>
    <h1>Strata</h1>
    <p class="subtitle">Simulation terrain monitor</p>

    <div class="bar">
        <button data-post="/api/render/pause">Pause view</button>
        <button data-post="/api/render/resume">Resume view</button>
        <label><input type="checkbox" id="agents" checked> agents</label>
        <label>ramp
            <select id="ramp">
                <option>standard</option>
                <option>dense</option>
                <option>blocks</option>
                <option>minimal</option>
                <option>dots</option>
            </select>
        </label>
        <label>fps <input type="number" id="fps" min="1" max="60" value="10" style="width:4rem"></label>
    </div>

    <div class="bar">
        <button data-post="/api/sim/pause">Pause sim</button>
        <button data-post="/api/sim/resume">Resume sim</button>
        <label>speed <input type="number" id="speed" min="0.1" step="0.1" value="1" style="width:4rem"></label>
        <button id="apply-speed">Set speed</button>
    </div>

    <p class="status" id="status">connecting...</p>
    <div id="terrain"></div>
    <div id="tooltip"></div>

    <script>
    (() => {
        const terrain = document.getElementById('terrain');
        const tooltip = document.getElementById('tooltip');
        const statusLine = document.getElementById('status');
        let frame = null;
        let socket = null;
        let pollTimer = null;
        let lastMessage = '';

        function draw(next) {
            frame = next;
            const rows = document.createDocumentFragment();
            for (const row of next.rows) {
                const div = document.createElement('div');
                const p = row.perspective;
                div.className = 'row';
                div.dataset.y = row.y;
                div.style.transform = `perspective(900px) translateY(${p.offset_y_px}px) rotateX(${p.rotate_x_deg}deg) scaleX(${p.scale_x})`;
                div.style.opacity = p.opacity;
                for (const seg of row.segments) {
                    const span = document.createElement('span');
                    span.className = 'c-' + seg.color_type;
                    span.dataset.x = seg.x;
                    span.style.filter = `brightness(${0.5 + seg.intensity})`;
                    span.textContent = seg.text;
                    div.appendChild(span);
                }
                rows.appendChild(div);
            }
            terrain.replaceChildren(rows);
            showStatus();
        }

        function showStatus(extra) {
            if (extra !== undefined) { lastMessage = extra; }
            const live = socket && socket.readyState === WebSocket.OPEN;
            const link = live ? '<span class="live">LIVE</span>' : '<span class="down">POLLING</span>';
            const stats = frame
                ? `${frame.stats.district_count} districts, ${frame.stats.visible_agents}/${frame.stats.agent_count} agents`
                : 'no frame';
            statusLine.innerHTML = `${link} ${stats} ${lastMessage}`;
        }

        function startPolling() {
            if (pollTimer) { return; }
            pollTimer = setInterval(async () => {
                try {
                    const res = await fetch('/api/frame');
                    if (res.ok) { draw(await res.json()); }
                } catch (_) { /* server down */ }
            }, 1000);
        }

        function stopPolling() {
            if (pollTimer) { clearInterval(pollTimer); pollTimer = null; }
        }

        function connect() {
            const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
            socket = new WebSocket(`${scheme}://${location.host}/ws/frames`);
            socket.onopen = () => { stopPolling(); showStatus(); };
            socket.onmessage = (event) => draw(JSON.parse(event.data));
            socket.onclose = () => {
                startPolling();
                showStatus();
                setTimeout(connect, 3000);
            };
        }

        terrain.addEventListener('mousemove', (event) => {
            const span = event.target.closest('span');
            const row = event.target.closest('.row');
            if (!frame || !span || !row) { tooltip.style.display = 'none'; return; }
            const rect = span.getBoundingClientRect();
            const chars = span.textContent.length || 1;
            const offset = Math.floor((event.clientX - rect.left) / (rect.width / chars));
            const x = Number(span.dataset.x) + Math.max(0, Math.min(chars - 1, offset));
            const meta = frame.metadata[`${x},${row.dataset.y}`];
            if (!meta) { tooltip.style.display = 'none'; return; }
            tooltip.textContent = meta.tooltip;
            tooltip.style.left = (event.clientX + 14) + 'px';
            tooltip.style.top = (event.clientY + 14) + 'px';
            tooltip.style.display = 'block';
        });
        terrain.addEventListener('mouseleave', () => { tooltip.style.display = 'none'; });

        async function post(path, body) {
            const res = await fetch(path, {
                method: 'POST',
                headers: { 'content-type': 'application/json' },
                body: body === undefined ? undefined : JSON.stringify(body),
            });
            const reply = await res.json().catch(() => ({}));
            showStatus(reply.message || reply.error || '');
        }

        for (const button of document.querySelectorAll('[data-post]')) {
            button.addEventListener('click', () => post(button.dataset.post));
        }
        document.getElementById('agents').addEventListener('change', (e) =>
            post('/api/render/show-agents', { show: e.target.checked }));
        document.getElementById('ramp').addEventListener('change', (e) =>
            post('/api/render/glyph-ramp', { ramp: e.target.value }));
        document.getElementById('fps').addEventListener('change', (e) =>
            post('/api/render/fps', { fps: Number(e.target.value) }));
        document.getElementById('apply-speed').addEventListener('click', () =>
            post('/api/sim/speed', { speed: Number(document.getElementById('speed').value) }));

        fetch('/api/frame').then((res) => res.json()).then(draw).catch(() => {});
        connect();
    })();
    </script>
</body>
</html>"##;
