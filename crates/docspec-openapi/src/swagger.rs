//! Swagger UI HTML generation

/// Default location of the Swagger UI distribution
pub const DEFAULT_ASSET_URL: &str = "https://unpkg.com/swagger-ui-dist@5";

/// Generate Swagger UI HTML page
///
/// `asset_url` is the base URL the `swagger-ui.css`, `swagger-ui-bundle.js`
/// and `swagger-ui-standalone-preset.js` files are loaded from.
pub fn generate_swagger_html(openapi_url: &str, asset_url: &str, title: &str) -> String {
    let asset_url = escape_html(asset_url.trim_end_matches('/'));
    let mut html = String::with_capacity(2048);
    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>"#,
    );
    html.push_str(&escape_html(title));
    html.push_str(
        r#"</title>
    <link rel="stylesheet" href=""#,
    );
    html.push_str(&asset_url);
    html.push_str(
        r#"/swagger-ui.css">
    <style>
        body {
            margin: 0;
            padding: 0;
        }
        .swagger-ui .topbar {
            display: none;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src=""#,
    );
    html.push_str(&asset_url);
    html.push_str(
        r#"/swagger-ui-bundle.js"></script>
    <script src=""#,
    );
    html.push_str(&asset_url);
    html.push_str(
        r#"/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: "#,
    );
    html.push_str(&js_string(openapi_url));
    html.push_str(
        r#",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>"#,
    );
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// JSON string literal that is also safe inside a `<script>` element
fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string().replace("</", "<\\/")
}
