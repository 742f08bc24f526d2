//! Single-page web client served at `/`.
//!
//! One self-contained HTML document: login/signup card, then the notes
//! board with client-side title search and category filtering. The bearer
//! token lives in browser `localStorage`; every API call attaches it. The
//! page is presentation only; all state comes from the REST endpoints.

use axum::response::Html;

/// GET / — the web client.
pub async fn handle_index() -> Html<String> {
    Html(render_app())
}

fn render_app() -> String {
    let mut page = String::with_capacity(24 * 1024);
    page.push_str(concat!(
        "<!DOCTYPE html>\n",
        "<html lang=\"en\"><head>\n",
        "<meta charset=\"utf-8\">",
        "<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n",
        "<title>Jotter</title>\n<style>"
    ));
    page.push_str(base_style());
    page.push_str("</style>\n</head><body>\n");
    page.push_str(APP_BODY);
    page.push_str("\n<script>\n");
    page.push_str(APP_SCRIPT);
    page.push_str("\n</script>\n</body></html>\n");
    page
}

fn base_style() -> &'static str {
    r##"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: #f5f5f5; color: #333; min-height: 100vh; padding: 20px;
    }
    .centered { display: flex; justify-content: center; align-items: center; min-height: 90vh; }
    .card {
        background: #fff; border-radius: 16px; padding: 28px;
        max-width: 420px; width: 100%; box-shadow: 0 4px 24px rgba(0,0,0,0.08);
    }
    .logo { text-align: center; margin-bottom: 24px; }
    .logo h1 { font-size: 28px; color: #1a1a2e; }
    .logo p { font-size: 14px; color: #666; margin-top: 4px; }
    .form-group { margin-bottom: 16px; }
    .form-group label { display: block; font-size: 14px; font-weight: 500; margin-bottom: 6px; color: #444; }
    .form-group input, .form-group textarea {
        width: 100%; padding: 12px 14px; border: 1.5px solid #ddd;
        border-radius: 10px; font-size: 16px; outline: none; transition: border-color 0.2s;
        font-family: inherit;
    }
    .form-group input:focus, .form-group textarea:focus { border-color: #4a6cf7; }
    .form-group textarea { min-height: 90px; resize: vertical; }
    .btn {
        padding: 12px 18px; border: none; border-radius: 10px;
        font-size: 15px; font-weight: 600; cursor: pointer; transition: background 0.2s;
    }
    .btn-primary { background: #4a6cf7; color: #fff; width: 100%; }
    .btn-primary:hover { background: #3b5de7; }
    .btn-secondary { background: #e8e8e8; color: #333; width: 100%; margin-top: 8px; }
    .btn-secondary:hover { background: #ddd; }
    .error { background: #fff0f0; color: #d32f2f; padding: 10px 14px; border-radius: 8px; font-size: 13px; margin-bottom: 16px; }
    .link { text-align: center; margin-top: 16px; font-size: 14px; color: #666; }
    .link a { color: #4a6cf7; text-decoration: none; }
    .link a:hover { text-decoration: underline; }
    .board { max-width: 860px; margin: 0 auto; }
    .topbar { display: flex; justify-content: space-between; align-items: center; margin-bottom: 18px; }
    .topbar h1 { font-size: 24px; color: #1a1a2e; }
    .topbar .who { font-size: 14px; color: #666; margin-right: 10px; }
    .btn-small {
        padding: 8px 12px; border: none; border-radius: 8px; font-size: 13px;
        background: #e8e8e8; color: #333; cursor: pointer;
    }
    .btn-small:hover { background: #ddd; }
    .btn-small.danger { background: #ffe3e3; color: #b42318; }
    .btn-small.danger:hover { background: #ffd0d0; }
    .filters { display: flex; gap: 10px; margin-bottom: 16px; flex-wrap: wrap; align-items: center; }
    .filters input[type=text], .filters select {
        padding: 10px 12px; border: 1.5px solid #ddd; border-radius: 10px;
        font-size: 14px; outline: none; background: #fff;
    }
    .filters input[type=text] { flex: 1; min-width: 180px; }
    .filters label { font-size: 13px; color: #555; }
    .note-form { margin-bottom: 20px; max-width: none; }
    .note-form input, .note-form textarea {
        width: 100%; padding: 10px 12px; border: 1.5px solid #ddd; border-radius: 10px;
        font-size: 14px; outline: none; margin-bottom: 10px; font-family: inherit;
    }
    .note-form textarea { min-height: 70px; resize: vertical; }
    .notes-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 14px; }
    .note-card {
        background: #fff; border-radius: 12px; padding: 16px;
        box-shadow: 0 2px 10px rgba(0,0,0,0.06); display: flex; flex-direction: column; gap: 8px;
    }
    .note-card.pinned { border: 1.5px solid #4a6cf7; }
    .note-card.archived { opacity: 0.65; }
    .note-card h3 { font-size: 16px; color: #1a1a2e; word-break: break-word; }
    .note-card .content { font-size: 14px; color: #555; white-space: pre-wrap; word-break: break-word; }
    .note-meta { font-size: 12px; color: #999; }
    .badge {
        display: inline-block; font-size: 11px; font-weight: 600; padding: 2px 8px;
        border-radius: 999px; background: #eef1ff; color: #4a6cf7; margin-left: 6px;
    }
    .badge.archived { background: #f0f0f0; color: #888; }
    .note-actions { display: flex; gap: 6px; flex-wrap: wrap; margin-top: auto; }
    .empty { text-align: center; color: #999; font-size: 14px; padding: 40px 0; }
    "##
}

const APP_BODY: &str = r##"
<div id="auth-view" class="centered">
  <div class="card">
    <div class="logo"><h1>Jotter</h1><p>Manage all your important notes easily</p></div>
    <div id="auth-error" class="error" hidden></div>
    <form id="login-form">
      <div class="form-group">
        <label>Email</label>
        <input type="email" id="login-email" required autocomplete="email" placeholder="you@example.com">
      </div>
      <div class="form-group">
        <label>Password</label>
        <input type="password" id="login-password" required autocomplete="current-password" placeholder="Your password">
      </div>
      <button type="submit" class="btn btn-primary">Log In</button>
    </form>
    <form id="signup-form" hidden>
      <div class="form-group">
        <label>Name</label>
        <input type="text" id="signup-name" required placeholder="Your name">
      </div>
      <div class="form-group">
        <label>Email</label>
        <input type="email" id="signup-email" required autocomplete="email" placeholder="you@example.com">
      </div>
      <div class="form-group">
        <label>Password</label>
        <input type="password" id="signup-password" required autocomplete="new-password" placeholder="Choose a password">
      </div>
      <button type="submit" class="btn btn-primary">Create Account</button>
    </form>
    <div class="link"><a href="#" id="auth-toggle">No account? Sign up</a></div>
  </div>
</div>

<div id="notes-view" class="board" hidden>
  <div class="topbar">
    <h1>Jotter</h1>
    <div>
      <span class="who" id="greeting"></span>
      <button class="btn-small" id="logout-btn">Log out</button>
      <button class="btn-small danger" id="delete-account-btn">Delete account</button>
    </div>
  </div>
  <div class="filters">
    <input type="text" id="search" placeholder="Search by title">
    <select id="category-filter"><option value="">All Categories</option></select>
    <label><input type="checkbox" id="show-archived"> Show archived</label>
  </div>
  <form id="note-form" class="card note-form">
    <input type="text" id="note-title" placeholder="Title" required>
    <textarea id="note-content" placeholder="Content" required></textarea>
    <input type="text" id="note-category" placeholder="Category (default: Personal)">
    <button type="submit" class="btn btn-primary" id="note-submit">Add Note</button>
    <button type="button" class="btn btn-secondary" id="note-cancel" hidden>Cancel</button>
  </form>
  <div id="notes-error" class="error" hidden></div>
  <div id="notes-list" class="notes-grid"></div>
</div>
"##;

const APP_SCRIPT: &str = r##"
'use strict';

const CATEGORIES = ['Personal', 'Work', 'Study', 'Other'];
let token = localStorage.getItem('jotter_token');
let userName = localStorage.getItem('jotter_name') || '';
let notes = [];
let editingId = null;

const el = (id) => document.getElementById(id);

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s == null ? '' : String(s);
  return d.innerHTML;
}

async function api(method, path, body) {
  const headers = {};
  if (body !== undefined) headers['Content-Type'] = 'application/json';
  if (token) headers['Authorization'] = 'Bearer ' + token;
  const res = await fetch(path, {
    method,
    headers,
    body: body === undefined ? undefined : JSON.stringify(body),
  });
  if (res.status === 401 || res.status === 403) {
    logout();
    throw new Error('Session expired. Please log in again.');
  }
  const data = await res.json().catch(() => ({}));
  if (!res.ok) throw new Error(data.error || 'Request failed');
  return data;
}

function showError(id, message) {
  const box = el(id);
  box.textContent = message;
  box.hidden = !message;
}

function showView() {
  el('auth-view').hidden = !!token;
  el('notes-view').hidden = !token;
  if (token) {
    el('greeting').textContent = userName ? 'Hi, ' + userName : '';
    loadNotes();
  }
}

function logout() {
  token = null;
  userName = '';
  localStorage.removeItem('jotter_token');
  localStorage.removeItem('jotter_name');
  notes = [];
  editingId = null;
  showView();
}

// ── Auth ──

el('auth-toggle').addEventListener('click', (e) => {
  e.preventDefault();
  const showingLogin = !el('login-form').hidden;
  el('login-form').hidden = showingLogin;
  el('signup-form').hidden = !showingLogin;
  el('auth-toggle').textContent = showingLogin
    ? 'Have an account? Log in'
    : 'No account? Sign up';
  showError('auth-error', '');
});

el('signup-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  try {
    await api('POST', '/signup', {
      name: el('signup-name').value,
      email: el('signup-email').value,
      password: el('signup-password').value,
    });
    const login = await api('POST', '/login', {
      email: el('signup-email').value,
      password: el('signup-password').value,
    });
    finishLogin(login);
  } catch (err) {
    showError('auth-error', err.message);
  }
});

el('login-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  try {
    const login = await api('POST', '/login', {
      email: el('login-email').value,
      password: el('login-password').value,
    });
    finishLogin(login);
  } catch (err) {
    showError('auth-error', err.message);
  }
});

function finishLogin(login) {
  token = login.token;
  userName = login.name || '';
  localStorage.setItem('jotter_token', token);
  localStorage.setItem('jotter_name', userName);
  showError('auth-error', '');
  showView();
}

el('logout-btn').addEventListener('click', logout);

el('delete-account-btn').addEventListener('click', async () => {
  if (!confirm('Delete your account and all notes? This cannot be undone.')) return;
  try {
    await api('DELETE', '/account');
    logout();
  } catch (err) {
    showError('notes-error', err.message);
  }
});

// ── Notes ──

async function loadNotes() {
  try {
    notes = await api('GET', '/notes');
    showError('notes-error', '');
    renderCategoryFilter();
    renderNotes();
  } catch (err) {
    showError('notes-error', err.message);
  }
}

function renderCategoryFilter() {
  const select = el('category-filter');
  const current = select.value;
  const seen = new Set(CATEGORIES);
  notes.forEach((n) => seen.add(n.category));
  select.innerHTML = '<option value="">All Categories</option>';
  [...seen].forEach((c) => {
    const opt = document.createElement('option');
    opt.value = c;
    opt.textContent = c;
    select.appendChild(opt);
  });
  select.value = current;
}

function statusRank(note) {
  if (note.status === 'pinned') return 0;
  if (note.status === 'archived') return 2;
  return 1;
}

function renderNotes() {
  const query = el('search').value.trim().toLowerCase();
  const category = el('category-filter').value;
  const showArchived = el('show-archived').checked;

  const visible = notes
    .filter((n) => n.title.toLowerCase().includes(query))
    .filter((n) => !category || n.category === category)
    .filter((n) => showArchived || n.status !== 'archived')
    .sort((a, b) => statusRank(a) - statusRank(b) || a.id - b.id);

  const list = el('notes-list');
  if (visible.length === 0) {
    list.innerHTML = '<div class="empty">No notes yet. Add one above.</div>';
    return;
  }

  list.innerHTML = visible
    .map((n) => {
      const badge =
        n.status === 'pinned'
          ? '<span class="badge">pinned</span>'
          : n.status === 'archived'
            ? '<span class="badge archived">archived</span>'
            : '';
      const actions = [
        '<button class="btn-small" data-act="edit" data-id="' + n.id + '">Edit</button>',
      ];
      if (n.status === 'active') {
        actions.push('<button class="btn-small" data-act="pin" data-id="' + n.id + '">Pin</button>');
        actions.push('<button class="btn-small" data-act="archive" data-id="' + n.id + '">Archive</button>');
      } else {
        actions.push('<button class="btn-small" data-act="restore" data-id="' + n.id + '">Restore</button>');
      }
      actions.push('<button class="btn-small danger" data-act="delete" data-id="' + n.id + '">Delete</button>');

      return (
        '<div class="note-card ' + esc(n.status) + '">' +
        '<h3>' + esc(n.title) + badge + '</h3>' +
        '<div class="content">' + esc(n.content) + '</div>' +
        '<div class="note-meta">Category: ' + esc(n.category) + '</div>' +
        '<div class="note-meta">Created: ' + fmtDate(n.created_at) +
        ' · Updated: ' + fmtDate(n.updated_at) + '</div>' +
        '<div class="note-actions">' + actions.join('') + '</div>' +
        '</div>'
      );
    })
    .join('');
}

function fmtDate(iso) {
  const d = new Date(iso);
  return isNaN(d) ? '' : d.toLocaleString();
}

el('search').addEventListener('input', renderNotes);
el('category-filter').addEventListener('change', renderNotes);
el('show-archived').addEventListener('change', renderNotes);

el('note-form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const payload = {
    title: el('note-title').value,
    content: el('note-content').value,
  };
  const category = el('note-category').value.trim();
  try {
    if (editingId === null) {
      if (category) payload.category = category;
      await api('POST', '/notes', payload);
    } else {
      payload.category = category || 'Personal';
      await api('PUT', '/notes/' + editingId, payload);
    }
    resetForm();
    await loadNotes();
  } catch (err) {
    showError('notes-error', err.message);
  }
});

el('note-cancel').addEventListener('click', resetForm);

function resetForm() {
  editingId = null;
  el('note-title').value = '';
  el('note-content').value = '';
  el('note-category').value = '';
  el('note-submit').textContent = 'Add Note';
  el('note-cancel').hidden = true;
}

el('notes-list').addEventListener('click', async (e) => {
  const btn = e.target.closest('button[data-act]');
  if (!btn) return;
  const id = Number(btn.dataset.id);
  const note = notes.find((n) => n.id === id);
  if (!note) return;

  try {
    switch (btn.dataset.act) {
      case 'edit':
        editingId = id;
        el('note-title').value = note.title;
        el('note-content').value = note.content;
        el('note-category').value = note.category;
        el('note-submit').textContent = 'Save Edit';
        el('note-cancel').hidden = false;
        window.scrollTo({ top: 0, behavior: 'smooth' });
        return;
      case 'pin':
        await api('PATCH', '/notes/' + id + '/pin');
        break;
      case 'archive':
        await api('PATCH', '/notes/' + id + '/archive');
        break;
      case 'restore':
        await api('PUT', '/notes/' + id, {
          title: note.title,
          content: note.content,
          category: note.category,
          status: 'active',
        });
        break;
      case 'delete':
        if (!confirm('Delete this note?')) return;
        await api('DELETE', '/notes/' + id);
        break;
    }
    await loadNotes();
  } catch (err) {
    showError('notes-error', err.message);
  }
});

showView();
"##;
