/// HTML for the front page

struct EndpointLink {
    path: &'static str,
    description: &'static str,
}

const ENDPOINTS: &[EndpointLink] = &[
    EndpointLink {
        path: "/metrics",
        description: "Exporter metrics (collections, rate-limit state, world feed health)",
    },
    EndpointLink {
        path: "/metrics/steam/{steam_id}",
        description: "Steam playtime and achievements for one user",
    },
    EndpointLink {
        path: "/metrics/osrs/vanilla/{player}",
        description: "OSRS hiscores for one player",
    },
    EndpointLink {
        path: "/metrics/osrs/gridmaster/{player}",
        description: "OSRS Gridmaster tournament hiscores for one player",
    },
    EndpointLink {
        path: "/metrics/osrs/worlds",
        description: "OSRS player count per world",
    },
    EndpointLink {
        path: "/healthz",
        description: "Liveness and uptime",
    },
];

pub fn index_page(steam_enabled: bool) -> String {
    let items: String = ENDPOINTS
        .iter()
        .map(|e| {
            format!(
                "        <li><a href=\"{path}\">{path}</a> - {description}</li>\n",
                path = e.path,
                description = e.description
            )
        })
        .collect();

    let steam_note = if steam_enabled {
        ""
    } else {
        "    <p><strong>Steam collection is disabled:</strong> set STEAM_KEY to enable it.</p>\n"
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Game Stats Exporter</title>
</head>
<body>
    <h1>Game Stats Exporter</h1>
    <p>Prometheus metrics exporter for Steam and OSRS stats</p>
{steam_note}    <h2>Endpoints</h2>
    <ul>
{items}    </ul>
    <p>v{version}</p>
</body>
</html>"#,
        steam_note = steam_note,
        items = items,
        version = env!("CARGO_PKG_VERSION"),
    )
}
