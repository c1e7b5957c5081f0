//! Test fixtures - files a typical application checkout contains.

#![allow(dead_code)]

pub const ENV_TEMPLATE: &str = "\
# Copy to .env and fill in
SECRET_KEY=replace-me
JWT_SECRET=replace-me
CORS_ORIGINS=http://localhost:5173
DATABASE_URL=sqlite:///./data/app.db
";

pub const REQUIREMENTS: &str = "\
fastapi==0.110.0
uvicorn[standard]==0.29.0
python-jose==3.3.0
";

pub const APP_JS: &str = "\
// Frontend entry point
const API_BASE = \"http://localhost:8000\";

export async function login(user, pass) {
  return fetch(`${API_BASE}/auth/login`, { method: \"POST\" });
}
";

pub const INDEX_HTML: &str = "<!doctype html><script type=\"module\" src=\"app.js\"></script>\n";
